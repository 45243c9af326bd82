use std::collections::HashSet;

use tantivy::{
    Index,
    IndexReader,
    IndexWriter,
    TantivyDocument,
    Term,
    collector::TopDocs,
    doc,
    query::{BooleanQuery, FuzzyTermQuery, Occur, Query, QueryParser},
    schema::*,
    tokenizer::{
        LowerCaser,
        RemoveLongFilter,
        SimpleTokenizer,
        Stemmer,
        TextAnalyzer,
    },
};

use crate::error::Result;

/// Field names used in the schema.
pub mod fields {
    pub const CHUNK_ID: &str = "chunk_id";
    pub const TITLE: &str = "title";
    pub const BODY: &str = "body";
}

const TOKENIZER: &str = "en_stem";

/// Heap budget handed to the tantivy writer.
pub const WRITER_MEMORY_BUDGET: usize = 50_000_000;

/// In-memory keyword index over document chunks.
pub struct KeywordIndex {
    index: Index,
    reader: IndexReader,
    fields: SchemaFields,
}

#[derive(Clone, Copy)]
struct SchemaFields {
    chunk_id: Field,
    title: Field,
    body: Field,
}

/// A keyword match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeywordHit {
    pub chunk_id: u64,
    pub score: f32,
}

fn build_schema() -> (Schema, SchemaFields) {
    let mut builder = Schema::builder();

    let chunk_id = builder.add_u64_field(fields::CHUNK_ID, STORED | FAST);

    let text_indexing = TextFieldIndexing::default()
        .set_tokenizer(TOKENIZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let title = builder.add_text_field(
        fields::TITLE,
        TextOptions::default().set_indexing_options(text_indexing.clone()),
    );
    let body = builder.add_text_field(
        fields::BODY,
        TextOptions::default().set_indexing_options(text_indexing),
    );

    (
        builder.build(),
        SchemaFields {
            chunk_id,
            title,
            body,
        },
    )
}

fn register_tokenizers(index: &Index) {
    let en_stem = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(Stemmer::new(tantivy::tokenizer::Language::English))
        .build();
    index.tokenizers().register(TOKENIZER, en_stem);
}

impl KeywordIndex {
    pub fn open_in_ram() -> Result<Self> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        register_tokenizers(&index);
        let reader = index.reader()?;

        Ok(Self {
            index,
            reader,
            fields,
        })
    }

    pub fn writer(&self) -> Result<IndexWriter> {
        Ok(self.index.writer(WRITER_MEMORY_BUDGET)?)
    }

    /// Add one chunk via the given writer. Changes become searchable after
    /// the writer commits and [`KeywordIndex::reload`] runs.
    pub fn add_chunk(
        &self,
        writer: &IndexWriter,
        chunk_id: u64,
        title: &str,
        body: &str,
    ) -> Result<()> {
        let f = self.fields;
        writer.add_document(doc!(
            f.chunk_id => chunk_id,
            f.title => title,
            f.body => body,
        ))?;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        Ok(self.reader.reload()?)
    }

    /// BM25 over title and body, ORed with edit-distance-1 fuzzy term
    /// queries on the body for every query word of three or more letters.
    pub fn search_fuzzy(
        &self,
        query_str: &str,
        limit: usize,
    ) -> Result<Vec<KeywordHit>> {
        let f = self.fields;
        let searcher = self.reader.searcher();

        let mut parser =
            QueryParser::for_index(&self.index, vec![f.title, f.body]);
        parser.set_field_boost(f.title, 2.0);
        let (bm25_query, errors) = parser.parse_query_lenient(query_str);
        if !errors.is_empty() {
            tracing::trace!(?errors, "lenient query parse");
        }

        let mut clauses: Vec<(Occur, Box<dyn Query>)> =
            vec![(Occur::Should, bm25_query)];
        for word in query_str.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if word.chars().count() >= 3 {
                let term = Term::from_field_text(f.body, &word);
                clauses.push((
                    Occur::Should,
                    Box::new(FuzzyTermQuery::new(term, 1, true)),
                ));
            }
        }
        let query = BooleanQuery::new(clauses);

        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;

        let mut seen = HashSet::new();
        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let Some(chunk_id) =
                doc.get_first(f.chunk_id).and_then(|v| v.as_u64())
            else {
                continue;
            };
            if seen.insert(chunk_id) {
                hits.push(KeywordHit { chunk_id, score });
            }
        }

        Ok(hits)
    }
}

impl std::fmt::Debug for KeywordIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordIndex").finish_non_exhaustive()
    }
}
