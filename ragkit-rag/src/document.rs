//! Data types for documents, corpora, and retrieval results.

use serde::{Deserialize, Serialize};

/// A source document: opaque text plus its position in the corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Position of the document in its corpus, assigned at ingestion.
    pub id: usize,
    /// The text content of the document.
    pub text: String,
}

/// An ordered, immutable collection of [`Document`]s.
///
/// Identifiers are assigned from corpus order and never change. Build a new
/// corpus when the underlying texts change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    /// Create a corpus from texts; each text's position becomes its identifier.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let documents = texts
            .into_iter()
            .enumerate()
            .map(|(id, text)| Document { id, text: text.into() })
            .collect();
        Self { documents }
    }

    /// Split a block of pasted text into one document per non-blank line.
    ///
    /// Lines are trimmed; lines that are empty after trimming are dropped
    /// before identifiers are assigned.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ragkit_rag::Corpus;
    ///
    /// let corpus = Corpus::from_lines("\n  first  \n\nsecond\n");
    /// assert_eq!(corpus.len(), 2);
    /// assert_eq!(corpus.get(1).unwrap().text, "second");
    /// ```
    pub fn from_lines(text: &str) -> Self {
        Self::from_texts(text.lines().map(str::trim).filter(|line| !line.is_empty()))
    }

    /// Return the document with the given identifier.
    pub fn get(&self, id: usize) -> Option<&Document> {
        self.documents.get(id)
    }

    /// Return all documents in corpus order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Return the document texts in corpus order.
    pub fn texts(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// A retrieved [`Document`] paired with its distance to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    /// Identifier of the matching document.
    pub id: usize,
    /// Text of the matching document.
    pub text: String,
    /// Squared L2 distance to the query (lower is more relevant).
    pub distance: f32,
}

impl RetrievalResult {
    /// The [`Document`] this result was resolved from.
    pub fn to_document(&self) -> Document {
        Document { id: self.id, text: self.text.clone() }
    }
}
