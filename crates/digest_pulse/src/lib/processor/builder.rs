use digest_store::BatchStore;

use crate::{
    aggregator::VideoSearchAggregator,
    yt::{SearchService, TranscriptService},
    BatchProcessor, Summarizer,
};

pub struct BatchProcessorBuilder<D = (), S = (), T = (), M = ()> {
    store: D,
    search: S,
    transcripts: T,
    summarizer: M,
    max_results: u32,
    languages: Vec<String>,
}

impl Default for BatchProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchProcessorBuilder {
    pub const DEFAULT_LANGUAGES: [&'static str; 2] = ["pt", "en"];

    pub fn new() -> Self {
        Self {
            store: (),
            search: (),
            transcripts: (),
            summarizer: (),
            max_results: 10,
            languages: Self::DEFAULT_LANGUAGES.map(String::from).to_vec(),
        }
    }
}

impl<D, S, T, M> BatchProcessorBuilder<D, S, T, M> {
    pub fn store<D2: BatchStore + Send + Sync + 'static>(
        self,
        store: D2,
    ) -> BatchProcessorBuilder<D2, S, T, M> {
        BatchProcessorBuilder {
            store,
            search: self.search,
            transcripts: self.transcripts,
            summarizer: self.summarizer,
            max_results: self.max_results,
            languages: self.languages,
        }
    }

    pub fn search_service<S2: SearchService + Send + Sync + 'static>(
        self,
        search: S2,
    ) -> BatchProcessorBuilder<D, S2, T, M> {
        BatchProcessorBuilder {
            store: self.store,
            search,
            transcripts: self.transcripts,
            summarizer: self.summarizer,
            max_results: self.max_results,
            languages: self.languages,
        }
    }

    pub fn transcripts<T2: TranscriptService + Send + Sync + 'static>(
        self,
        transcripts: T2,
    ) -> BatchProcessorBuilder<D, S, T2, M> {
        BatchProcessorBuilder {
            store: self.store,
            search: self.search,
            transcripts,
            summarizer: self.summarizer,
            max_results: self.max_results,
            languages: self.languages,
        }
    }

    pub fn summarizer<M2: Summarizer + Send + Sync + 'static>(
        self,
        summarizer: M2,
    ) -> BatchProcessorBuilder<D, S, T, M2> {
        BatchProcessorBuilder {
            store: self.store,
            search: self.search,
            transcripts: self.transcripts,
            summarizer,
            max_results: self.max_results,
            languages: self.languages,
        }
    }

    /// Page size of each per-token search
    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Transcript languages, most preferred first
    pub fn languages<I, L>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }
}

impl<D, S, T, M> BatchProcessorBuilder<D, S, T, M>
where
    D: BatchStore + Send + Sync + 'static,
    S: SearchService + Send + Sync + 'static,
    T: TranscriptService + Send + Sync + 'static,
    M: Summarizer + Send + Sync + 'static,
{
    pub fn build(self) -> BatchProcessor<D, S, T, M> {
        BatchProcessor {
            store: self.store,
            aggregator: VideoSearchAggregator::new(self.search).with_max_results(self.max_results),
            transcripts: self.transcripts,
            summarizer: self.summarizer,
            languages: self.languages,
        }
    }
}
