//! Tantivy-based search index module.
//!
//! Full-text search over restaurant name, description and tags with field boosting.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::Restaurant;

/// Name matches outrank description matches, tags trail behind.
const BOOST_NAME: f32 = 10.0;
const BOOST_DESCRIPTION: f32 = 5.0;
const BOOST_TAGS: f32 = 2.5;

/// Search result with restaurant id and relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub restaurant_id: String,
    pub score: f32,
}

/// Search index schema fields.
struct SearchFields {
    restaurant_id: Field,
    name: Field,
    description: Field,
    tags: Field,
}

/// Tantivy search index for restaurants.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let restaurant_id = schema_builder.add_text_field("restaurant_id", STRING | STORED);
        let name = schema_builder.add_text_field("name", TEXT | STORED);
        let description = schema_builder.add_text_field("description", TEXT);
        let tags = schema_builder.add_text_field("tags", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            restaurant_id,
            name,
            description,
            tags,
        };

        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index from restaurants.
    pub async fn rebuild(&self, restaurants: &[Restaurant]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for restaurant in restaurants {
            writer.add_document(self.create_document(restaurant))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} restaurants", restaurants.len());
        Ok(())
    }

    /// Index (or re-index) a single restaurant.
    pub async fn index_restaurant(&self, restaurant: &Restaurant) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        let term = tantivy::Term::from_field_text(self.fields.restaurant_id, &restaurant.id);
        writer.delete_term(term);

        writer.add_document(self.create_document(restaurant))?;
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Search for restaurants matching the query.
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<SearchResult>, AppError> {
        if query_str.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let field_queries = [
            (self.fields.name, BOOST_NAME),
            (self.fields.description, BOOST_DESCRIPTION),
            (self.fields.tags, BOOST_TAGS),
        ];

        let mut subqueries: Vec<(Occur, Box<dyn tantivy::query::Query>)> = Vec::new();
        for (field, boost) in field_queries {
            let mut field_parser = QueryParser::for_index(&self.index, vec![field]);
            field_parser.set_conjunction_by_default();
            let (field_query, _) = field_parser.parse_query_lenient(query_str);
            subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
        }
        let combined_query = BooleanQuery::new(subqueries);

        let top_docs = searcher
            .search(&combined_query, &TopDocs::with_limit(limit))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let results = top_docs
            .into_iter()
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let restaurant_id = doc
                    .get_first(self.fields.restaurant_id)?
                    .as_str()?
                    .to_string();
                Some(SearchResult {
                    restaurant_id,
                    score,
                })
            })
            .collect();

        Ok(results)
    }

    fn create_document(&self, restaurant: &Restaurant) -> TantivyDocument {
        doc!(
            self.fields.restaurant_id => restaurant.id.clone(),
            self.fields.name => restaurant.name.clone(),
            self.fields.description => restaurant.description.clone().unwrap_or_default(),
            self.fields.tags => restaurant.tags.join(" ")
        )
    }
}
