//! Property tests for exact L2 search.

use ragkit_rag::{FlatL2Index, RagError, squared_l2};
use proptest::prelude::*;

const DIM: usize = 8;

fn arb_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-100.0f32..100.0f32, dim)
}

fn arb_embeddings() -> impl Strategy<Value = Vec<Vec<f32>>> {
    proptest::collection::vec(arb_embedding(DIM), 1..40)
}

/// *For any* stored embeddings and query, `search` returns `min(k, N)`
/// results ordered by non-decreasing distance, ties by ascending id, and each
/// reported distance equals the squared L2 distance of that stored vector.
mod prop_search_ordering {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn results_are_bounded_and_ordered(
            embeddings in arb_embeddings(),
            query in arb_embedding(DIM),
            k in 1usize..50,
        ) {
            let index = FlatL2Index::build(&embeddings).unwrap();
            let hits = index.search(&query, k).unwrap();

            prop_assert_eq!(hits.len(), k.min(embeddings.len()));
            for pair in hits.windows(2) {
                prop_assert!(
                    pair[0].distance < pair[1].distance
                        || (pair[0].distance == pair[1].distance && pair[0].id < pair[1].id),
                    "out of order: {:?} then {:?}", pair[0], pair[1],
                );
            }
            for hit in &hits {
                prop_assert_eq!(hit.distance, squared_l2(&embeddings[hit.id], &query));
            }
        }

        #[test]
        fn truncated_results_are_a_prefix_of_the_full_ranking(
            embeddings in arb_embeddings(),
            query in arb_embedding(DIM),
            k in 1usize..10,
        ) {
            let index = FlatL2Index::build(&embeddings).unwrap();
            let full = index.search(&query, embeddings.len()).unwrap();
            let top = index.search(&query, k).unwrap();
            prop_assert_eq!(&full[..top.len()], &top[..]);
        }
    }
}

/// *For any* stored embedding used as the query, that embedding is found at
/// distance 0 and ranks first unless an identical vector was stored earlier.
mod prop_self_match {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn stored_vector_matches_itself_first(
            embeddings in arb_embeddings(),
            pick in any::<prop::sample::Index>(),
        ) {
            let target = pick.index(embeddings.len());
            let index = FlatL2Index::build(&embeddings).unwrap();
            let hits = index.search(&embeddings[target], 1).unwrap();

            let first_identical =
                embeddings.iter().position(|e| e == &embeddings[target]).unwrap();
            prop_assert_eq!(hits[0].id, first_identical);
            prop_assert_eq!(hits[0].distance, 0.0);
        }
    }
}

/// *For any* corpus, searching with k = N and re-sorting by id yields every
/// id exactly once.
mod prop_round_trip {
    use super::*;

    proptest! {
        #[test]
        fn full_search_covers_every_id_once(
            embeddings in arb_embeddings(),
            query in arb_embedding(DIM),
        ) {
            let index = FlatL2Index::build(&embeddings).unwrap();
            let mut ids: Vec<usize> =
                index.search(&query, embeddings.len()).unwrap().iter().map(|n| n.id).collect();
            ids.sort_unstable();
            prop_assert_eq!(ids, (0..embeddings.len()).collect::<Vec<_>>());
        }
    }
}

/// *For any* query whose length differs from the index dimensionality,
/// `search` fails with `DimensionMismatch` and never truncates or pads.
mod prop_dimension_mismatch {
    use super::*;

    proptest! {
        #[test]
        fn wrong_length_query_always_fails(
            embeddings in arb_embeddings(),
            query_len in (0usize..20).prop_filter("differs from DIM", |n| *n != DIM),
        ) {
            let index = FlatL2Index::build(&embeddings).unwrap();
            let query = vec![0.0f32; query_len];
            match index.search(&query, 1) {
                Err(RagError::DimensionMismatch { expected, actual }) => {
                    prop_assert_eq!(expected, DIM);
                    prop_assert_eq!(actual, query_len);
                }
                other => prop_assert!(false, "expected DimensionMismatch, got {:?}", other),
            }
        }
    }
}
