use mongodb::bson::{Document, doc};
use mongodb::options::{
    AggregateOptions, Collation, DeleteOptions, FindOneOptions, FindOptions, InsertManyOptions,
    InsertOneOptions, ReplaceOptions, UpdateModifications, UpdateOptions,
};
use mongodb::results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult};
use mongodb::{Collection, Cursor};

use super::bulk::{
    MAX_COMMAND_BYTES, MAX_WRITE_BATCH_SIZE, ReplaceManyOptions, ReplaceManyResult,
    replace_statements, update_commands,
};
use super::hook::MongoHook;
use super::projection::Projection;
use crate::error::MongoHookError;

// Every operation below selects a collection (mongo_db overrides the record's schema)
// and forwards to the driver call of the same name. Driver errors pass through.
impl MongoHook {
    /// Fetch a collection handle, opening the client if needed.
    ///
    /// Uses the connection schema as the database unless `mongo_db` is given.
    ///
    /// # Errors
    /// Returns `MongoHookError::ConfigError` if neither `mongo_db` nor the record names a database.
    pub async fn get_collection(
        &self,
        mongo_collection: &str,
        mongo_db: Option<&str>,
    ) -> Result<Collection<Document>, MongoHookError> {
        let db_name = mongo_db
            .or(self.connection().schema.as_deref())
            .filter(|name| !name.is_empty());
        let client = self.get_conn().await?;
        let database = match db_name {
            Some(name) => client.database(name),
            None => client.default_database().ok_or_else(|| {
                MongoHookError::ConfigError(format!(
                    "no database given for {mongo_collection} and connection {} has no schema",
                    self.conn_id()
                ))
            })?,
        };
        Ok(database.collection::<Document>(mongo_collection))
    }

    /// Run an aggregation pipeline.
    ///
    /// # Errors
    /// Returns the driver error if the pipeline fails.
    pub async fn aggregate(
        &self,
        mongo_collection: &str,
        aggregate_query: Vec<Document>,
        mongo_db: Option<&str>,
        options: impl Into<Option<AggregateOptions>>,
    ) -> Result<Cursor<Document>, MongoHookError> {
        let collection = self.get_collection(mongo_collection, mongo_db).await?;
        Ok(collection
            .aggregate(aggregate_query)
            .with_options(options)
            .await?)
    }

    /// Run a find query and return the cursor.
    ///
    /// ```rust,no_run
    /// use futures_util::TryStreamExt;
    /// use mongo_hook::prelude::*;
    /// use mongodb::bson::{Document, doc};
    ///
    /// # async fn example(hook: &MongoHook) -> Result<(), MongoHookError> {
    /// let cursor = hook
    ///     .find("orders", doc! { "status": "open" }, None, Some(["total"].into()), None)
    ///     .await?;
    /// let open: Vec<Document> = cursor.try_collect().await?;
    /// # let _ = open;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Returns the driver error if the query fails.
    pub async fn find(
        &self,
        mongo_collection: &str,
        query: Document,
        mongo_db: Option<&str>,
        projection: Option<Projection>,
        options: impl Into<Option<FindOptions>>,
    ) -> Result<Cursor<Document>, MongoHookError> {
        let collection = self.get_collection(mongo_collection, mongo_db).await?;
        let mut options = options.into().unwrap_or_default();
        if let Some(projection) = projection {
            options.projection = Some(projection.into_document());
        }
        Ok(collection.find(query).with_options(options).await?)
    }

    /// Run a find query and return the first match.
    ///
    /// # Errors
    /// Returns the driver error if the query fails.
    pub async fn find_one(
        &self,
        mongo_collection: &str,
        query: Document,
        mongo_db: Option<&str>,
        projection: Option<Projection>,
        options: impl Into<Option<FindOneOptions>>,
    ) -> Result<Option<Document>, MongoHookError> {
        let collection = self.get_collection(mongo_collection, mongo_db).await?;
        let mut options = options.into().unwrap_or_default();
        if let Some(projection) = projection {
            options.projection = Some(projection.into_document());
        }
        Ok(collection.find_one(query).with_options(options).await?)
    }

    /// # Errors
    /// Returns the driver error if the insert fails.
    pub async fn insert_one(
        &self,
        mongo_collection: &str,
        doc: Document,
        mongo_db: Option<&str>,
        options: impl Into<Option<InsertOneOptions>>,
    ) -> Result<InsertOneResult, MongoHookError> {
        let collection = self.get_collection(mongo_collection, mongo_db).await?;
        Ok(collection.insert_one(doc).with_options(options).await?)
    }

    /// # Errors
    /// Returns the driver error if the insert fails.
    pub async fn insert_many(
        &self,
        mongo_collection: &str,
        docs: Vec<Document>,
        mongo_db: Option<&str>,
        options: impl Into<Option<InsertManyOptions>>,
    ) -> Result<InsertManyResult, MongoHookError> {
        let collection = self.get_collection(mongo_collection, mongo_db).await?;
        Ok(collection.insert_many(docs).with_options(options).await?)
    }

    /// Update the first document matching `filter_doc`.
    ///
    /// # Errors
    /// Returns the driver error if the update fails.
    pub async fn update_one(
        &self,
        mongo_collection: &str,
        filter_doc: Document,
        update_doc: impl Into<UpdateModifications>,
        mongo_db: Option<&str>,
        options: impl Into<Option<UpdateOptions>>,
    ) -> Result<UpdateResult, MongoHookError> {
        let collection = self.get_collection(mongo_collection, mongo_db).await?;
        Ok(collection
            .update_one(filter_doc, update_doc)
            .with_options(options)
            .await?)
    }

    /// Update every document matching `filter_doc`.
    ///
    /// # Errors
    /// Returns the driver error if the update fails.
    pub async fn update_many(
        &self,
        mongo_collection: &str,
        filter_doc: Document,
        update_doc: impl Into<UpdateModifications>,
        mongo_db: Option<&str>,
        options: impl Into<Option<UpdateOptions>>,
    ) -> Result<UpdateResult, MongoHookError> {
        let collection = self.get_collection(mongo_collection, mongo_db).await?;
        Ok(collection
            .update_many(filter_doc, update_doc)
            .with_options(options)
            .await?)
    }

    /// Replace a single document.
    ///
    /// Without a filter (or with an empty one) the replacement's own `_id` is
    /// used as the filter.
    ///
    /// # Errors
    /// Returns `MongoHookError::MissingId` if no filter is given and `doc` has no `_id`,
    /// otherwise the driver error if the replace fails.
    pub async fn replace_one(
        &self,
        mongo_collection: &str,
        doc: Document,
        filter_doc: Option<Document>,
        mongo_db: Option<&str>,
        options: impl Into<Option<ReplaceOptions>>,
    ) -> Result<UpdateResult, MongoHookError> {
        let filter_doc = replacement_filter(&doc, filter_doc)?;
        let collection = self.get_collection(mongo_collection, mongo_db).await?;
        Ok(collection
            .replace_one(filter_doc, doc)
            .with_options(options)
            .await?)
    }

    /// Replace many documents in bulk.
    ///
    /// Without filters (or with an empty list) each replacement's `_id` is used
    /// as its filter. Otherwise `filter_docs[i]` selects the document `docs[i]` replaces.
    /// The replacements go out as `update` commands, as few as the server's batch
    /// limits allow, so any server version that supports collation can take them.
    ///
    /// # Errors
    /// Returns `MongoHookError::ParameterError` for an empty `docs` list or a filter count
    /// that differs from the document count, `MongoHookError::MissingId` for a document
    /// without `_id` when filters are omitted, `MongoHookError::WriteError` when the server
    /// rejects individual replacements, otherwise the driver error.
    #[allow(clippy::too_many_arguments)]
    pub async fn replace_many(
        &self,
        mongo_collection: &str,
        docs: Vec<Document>,
        filter_docs: Option<Vec<Document>>,
        mongo_db: Option<&str>,
        upsert: bool,
        collation: Option<Collation>,
        options: impl Into<Option<ReplaceManyOptions>>,
    ) -> Result<ReplaceManyResult, MongoHookError> {
        let options = options.into().unwrap_or_default();
        let statements = replace_statements(docs, filter_docs, upsert, collation.as_ref())?;
        let collection = self.get_collection(mongo_collection, mongo_db).await?;
        let namespace = collection.namespace();
        let commands = update_commands(
            &namespace.coll,
            statements,
            &options,
            MAX_WRITE_BATCH_SIZE,
            MAX_COMMAND_BYTES,
        )?;
        tracing::debug!(
            conn_id = %self.conn_id(),
            namespace = %namespace,
            batches = commands.len(),
            "replace_many"
        );

        let database = self.get_conn().await?.database(&namespace.db);
        let mut result = ReplaceManyResult::default();
        let mut failures = Vec::new();
        for (offset, command) in commands {
            let reply = database.run_command(command).await?;
            failures.extend(result.absorb(offset, &reply));
            if options.is_ordered() && !failures.is_empty() {
                break;
            }
        }

        if failures.is_empty() {
            Ok(result)
        } else {
            Err(MongoHookError::WriteError(format!(
                "{} ({} matched, {} modified, {} upserted before failing)",
                failures.join("; "),
                result.matched_count,
                result.modified_count,
                result.upserted_count()
            )))
        }
    }

    /// # Errors
    /// Returns the driver error if the delete fails.
    pub async fn delete_one(
        &self,
        mongo_collection: &str,
        filter_doc: Document,
        mongo_db: Option<&str>,
        options: impl Into<Option<DeleteOptions>>,
    ) -> Result<DeleteResult, MongoHookError> {
        let collection = self.get_collection(mongo_collection, mongo_db).await?;
        Ok(collection
            .delete_one(filter_doc)
            .with_options(options)
            .await?)
    }

    /// # Errors
    /// Returns the driver error if the delete fails.
    pub async fn delete_many(
        &self,
        mongo_collection: &str,
        filter_doc: Document,
        mongo_db: Option<&str>,
        options: impl Into<Option<DeleteOptions>>,
    ) -> Result<DeleteResult, MongoHookError> {
        let collection = self.get_collection(mongo_collection, mongo_db).await?;
        Ok(collection
            .delete_many(filter_doc)
            .with_options(options)
            .await?)
    }
}

/// Filter for a replace: the given one, or `{_id: doc._id}` when absent or empty.
///
/// # Errors
/// Returns `MongoHookError::MissingId` when falling back and `doc` has no `_id`.
pub fn replacement_filter(
    doc: &Document,
    filter_doc: Option<Document>,
) -> Result<Document, MongoHookError> {
    match filter_doc {
        Some(filter_doc) if !filter_doc.is_empty() => Ok(filter_doc),
        _ => id_filter(doc),
    }
}

pub(crate) fn id_filter(doc: &Document) -> Result<Document, MongoHookError> {
    match doc.get("_id") {
        Some(id) => Ok(doc! { "_id": id.clone() }),
        None => Err(MongoHookError::MissingId(format!(
            "fields present: [{}]",
            doc.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacement_filter_prefers_non_empty_filter() {
        let doc = doc! { "_id": 7, "name": "x" };
        assert_eq!(
            replacement_filter(&doc, Some(doc! { "name": "y" })).unwrap(),
            doc! { "name": "y" }
        );
        assert_eq!(
            replacement_filter(&doc, Some(Document::new())).unwrap(),
            doc! { "_id": 7 }
        );
        assert_eq!(replacement_filter(&doc, None).unwrap(), doc! { "_id": 7 });
    }

    #[test]
    fn replacement_filter_without_id_fails() {
        let err = replacement_filter(&doc! { "name": "x" }, None).unwrap_err();
        assert!(matches!(err, MongoHookError::MissingId(msg) if msg.contains("name")));
    }
}
