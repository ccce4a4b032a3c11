//! Orchestrator: wires the crawler into the embedding pipeline, owns the
//! document collection, and serves queries.

use crate::config::Config;
use crate::crawler::Crawler;
use crate::docs::Document;
use crate::render::PageRenderer;
use crate::semantic::{prepare_for_embedding, EmbeddingService, SearchIndex};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Sentinel similarity reported in "no query" pass-through mode.
const NO_QUERY_SIMILARITY: f32 = 1.0;

#[derive(Clone, Debug, Serialize)]
pub struct SearchResult {
    pub document: Document,
    pub similarity: f32,
}

impl SearchResult {
    /// Similarity as a percentage, for rendering.
    pub fn similarity_percent(&self) -> f32 {
        self.similarity * 100.0
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IndexStats {
    /// Documents collected by the crawl
    pub crawled: usize,
    /// Documents that obtained an embedding and entered the index
    pub indexed: usize,
}

/// One-shot startup plus repeated queries.
///
/// The document collection is owned here exclusively; the index refers to
/// documents by position and holds no copies.
pub struct App<R> {
    config: Config,
    crawler: Crawler<R>,
    service: EmbeddingService,
    documents: Vec<Document>,
    index: Option<SearchIndex>,
    indexing: AtomicBool,
    /// Ticket counter making "latest query wins" explicit: a search that
    /// is stale by the time its embedding resolves yields None.
    query_seq: AtomicU64,
}

impl<R: PageRenderer> App<R> {
    pub fn new(config: Config, renderer: R) -> anyhow::Result<Self> {
        let crawler = Crawler::new(&config.crawl, renderer)?;
        let service = EmbeddingService::new(
            config.semantic_search.clone(),
            config.model_cache_dir(),
        );

        Ok(Self {
            config,
            crawler,
            service,
            documents: Vec::new(),
            index: None,
            indexing: AtomicBool::new(true),
            query_seq: AtomicU64::new(0),
        })
    }

    /// Crawl the seeds, embed every collected snippet, and build the
    /// search index.
    ///
    /// Embedding failures shrink the index rather than failing startup; if
    /// nothing obtains an embedding the index is absent and queries return
    /// empty result sets.
    pub async fn initialize(&mut self, seeds: &[String], max_depth: u32) -> IndexStats {
        self.indexing.store(true, Ordering::SeqCst);

        let mut documents = self.crawler.crawl(seeds, max_depth).await;

        // Positions of documents whose text survives input hygiene, kept
        // parallel to `texts` so vectors land on the right documents.
        let mut eligible = Vec::with_capacity(documents.len());
        let mut texts = Vec::with_capacity(documents.len());
        for (position, document) in documents.iter().enumerate() {
            if let Some(prepared) = prepare_for_embedding(&document.text) {
                eligible.push(position);
                texts.push(prepared);
            }
        }

        let batch_size = self.config.semantic_search.batch_size;
        let embedded = self.service.embed_batch_indexed(&texts, batch_size).await;

        for (text_index, vector) in embedded {
            let position = eligible[text_index];
            documents[position].embedding = Some(vector);
        }

        let entries: Vec<(usize, Vec<f32>)> = documents
            .iter()
            .enumerate()
            .filter_map(|(position, document)| {
                document
                    .embedding
                    .as_ref()
                    .map(|vector| (position, vector.clone()))
            })
            .collect();

        let stats = IndexStats {
            crawled: documents.len(),
            indexed: entries.len(),
        };

        self.index = if entries.is_empty() {
            log::warn!("no documents obtained embeddings, search index left empty");
            None
        } else {
            Some(SearchIndex::build(entries))
        };
        self.documents = documents;
        self.indexing.store(false, Ordering::SeqCst);

        log::info!(
            "index ready: {} of {} documents embedded",
            stats.indexed,
            stats.crawled
        );

        stats
    }

    /// Answer a query with up to `top_k` ranked results.
    ///
    /// - empty query: the full unranked document set with a sentinel
    ///   similarity ("no query" mode)
    /// - no index built: an empty result set, not an error
    /// - `None`: this query was superseded by a newer one while its
    ///   embedding was in flight; discard it
    pub async fn search(&self, query: &str, top_k: usize) -> Option<Vec<SearchResult>> {
        let ticket = self.query_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let query = query.trim();

        if query.is_empty() {
            return Some(
                self.documents
                    .iter()
                    .map(|document| SearchResult {
                        document: document.clone(),
                        similarity: NO_QUERY_SIMILARITY,
                    })
                    .collect(),
            );
        }

        let Some(index) = self.index.as_ref() else {
            return Some(vec![]);
        };

        let vector = match self.service.embed_query(query).await {
            Ok(vector) => vector,
            Err(err) => {
                log::warn!("query embedding failed: {err}");
                return Some(vec![]);
            }
        };

        if self.query_seq.load(Ordering::SeqCst) != ticket {
            log::debug!("query superseded while embedding, dropping results");
            return None;
        }

        let results = index
            .search(&vector, top_k)
            .into_iter()
            .filter_map(|hit| {
                self.documents.get(hit.position).map(|document| SearchResult {
                    document: document.clone(),
                    similarity: hit.score,
                })
            })
            .collect();

        Some(results)
    }

    /// True until startup (crawl + embed + build) completes.
    pub fn is_indexing(&self) -> bool {
        self.indexing.load(Ordering::SeqCst)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn indexed_count(&self) -> usize {
        self.index.as_ref().map(|index| index.len()).unwrap_or(0)
    }

    #[cfg(test)]
    pub(crate) fn set_corpus(&mut self, documents: Vec<Document>, index: Option<SearchIndex>) {
        self.documents = documents;
        self.index = index;
        self.indexing.store(false, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub(crate) fn set_encoder(
        &mut self,
        encoder: std::sync::Arc<dyn crate::semantic::embeddings::TextEncoder>,
    ) {
        self.service.set_encoder(encoder);
    }
}
