use std::collections::BTreeMap;

use mongodb::bson::{self, Bson, Document, doc};
use mongodb::options::{Collation, WriteConcern};

use super::executor::id_filter;
use crate::error::MongoHookError;

/// Most statements the server accepts in one write command.
pub const MAX_WRITE_BATCH_SIZE: usize = 100_000;
/// Byte budget for the statements of one command; the command document itself
/// must stay under the server's 16 MiB limit.
pub const MAX_COMMAND_BYTES: usize = 16 * 1024 * 1024 - 16 * 1024;

// per-statement array overhead: element type, index key and terminator
const ARRAY_ENTRY_OVERHEAD: usize = 8;

/// Command-level options for [`crate::mongo::MongoHook::replace_many`].
#[derive(Debug, Clone, Default)]
pub struct ReplaceManyOptions {
    /// Stop at the first failed replacement. Defaults to `true`.
    pub ordered: Option<bool>,
    pub bypass_document_validation: Option<bool>,
    pub write_concern: Option<WriteConcern>,
    pub comment: Option<Bson>,
}

impl ReplaceManyOptions {
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.ordered.unwrap_or(true)
    }
}

/// Counts reported by the server for a `replace_many` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaceManyResult {
    pub matched_count: u64,
    pub modified_count: u64,
    /// `_id` of each inserted document, keyed by its position in the input.
    pub upserted_ids: BTreeMap<usize, Bson>,
}

impl ReplaceManyResult {
    #[must_use]
    pub fn upserted_count(&self) -> usize {
        self.upserted_ids.len()
    }

    /// Fold one `update` command reply into the totals.
    ///
    /// `offset` is the input position of the batch's first statement. Returns a
    /// description of every write error and write concern error in the reply.
    pub fn absorb(&mut self, offset: usize, reply: &Document) -> Vec<String> {
        let upserted = reply
            .get_array("upserted")
            .map(Vec::as_slice)
            .unwrap_or_default();
        for entry in upserted {
            if let Bson::Document(entry) = entry {
                let index = offset + as_index(entry.get("index"));
                if let Some(id) = entry.get("_id") {
                    self.upserted_ids.insert(index, id.clone());
                }
            }
        }

        // n counts matched and upserted statements together
        let upserted = upserted.len() as u64;
        self.matched_count += as_count(reply.get("n")).saturating_sub(upserted);
        self.modified_count += as_count(reply.get("nModified"));

        let mut failures: Vec<String> = reply
            .get_array("writeErrors")
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(Bson::as_document)
            .map(|e| {
                format!(
                    "document {}: {} (code {})",
                    offset + as_index(e.get("index")),
                    e.get_str("errmsg").unwrap_or("unknown error"),
                    as_count(e.get("code"))
                )
            })
            .collect();
        if let Ok(wc) = reply.get_document("writeConcernError") {
            failures.push(format!(
                "write concern: {} (code {})",
                wc.get_str("errmsg").unwrap_or("unknown error"),
                as_count(wc.get("code"))
            ));
        }
        failures
    }
}

/// One `update` statement per document, replacing rather than modifying.
///
/// Without filters (or with an empty list) each document's `_id` is its filter.
///
/// # Errors
/// Returns `MongoHookError::ParameterError` for an empty `docs` list or a filter count
/// that differs from the document count, `MongoHookError::MissingId` for a document
/// without `_id` when filters are omitted, and `MongoHookError::BsonSerError` if the
/// collation cannot be serialized.
pub fn replace_statements(
    docs: Vec<Document>,
    filter_docs: Option<Vec<Document>>,
    upsert: bool,
    collation: Option<&Collation>,
) -> Result<Vec<Document>, MongoHookError> {
    if docs.is_empty() {
        return Err(MongoHookError::ParameterError(
            "replace_many needs at least one document".to_string(),
        ));
    }

    let filter_docs = match filter_docs {
        Some(filters) if !filters.is_empty() => {
            if filters.len() != docs.len() {
                return Err(MongoHookError::ParameterError(format!(
                    "replace_many got {} filters for {} documents",
                    filters.len(),
                    docs.len()
                )));
            }
            filters
        }
        _ => docs.iter().map(id_filter).collect::<Result<Vec<_>, _>>()?,
    };
    let collation = collation.map(bson::to_document).transpose()?;

    Ok(filter_docs
        .into_iter()
        .zip(docs)
        .map(|(filter, replacement)| {
            let mut statement = doc! {
                "q": filter,
                "u": replacement,
                "upsert": upsert,
                "multi": false,
            };
            if let Some(collation) = &collation {
                statement.insert("collation", collation.clone());
            }
            statement
        })
        .collect())
}

/// Split statements into `update` commands for `collection`, each paired with the
/// input position of its first statement.
///
/// A batch closes at `max_statements` statements or when the next one would push it
/// past `max_bytes`. A single oversized statement still gets its own command, and
/// the server reports it.
///
/// # Errors
/// Returns `MongoHookError::BsonSerError` if a statement or the write concern cannot
/// be serialized.
pub fn update_commands(
    collection: &str,
    statements: Vec<Document>,
    options: &ReplaceManyOptions,
    max_statements: usize,
    max_bytes: usize,
) -> Result<Vec<(usize, Document)>, MongoHookError> {
    let write_concern = options
        .write_concern
        .as_ref()
        .map(bson::to_bson)
        .transpose()?;

    let mut commands = Vec::new();
    let mut batch: Vec<Document> = Vec::new();
    let mut batch_bytes = 0;
    let mut offset = 0;

    for statement in statements {
        let size = bson::to_vec(&statement)?.len() + ARRAY_ENTRY_OVERHEAD;
        if !batch.is_empty() && (batch.len() >= max_statements || batch_bytes + size > max_bytes)
        {
            let len = batch.len();
            commands.push((
                offset,
                update_command(
                    collection,
                    std::mem::take(&mut batch),
                    options,
                    write_concern.as_ref(),
                ),
            ));
            offset += len;
            batch_bytes = 0;
        }
        batch_bytes += size;
        batch.push(statement);
    }
    if !batch.is_empty() {
        commands.push((
            offset,
            update_command(collection, batch, options, write_concern.as_ref()),
        ));
    }
    Ok(commands)
}

fn update_command(
    collection: &str,
    statements: Vec<Document>,
    options: &ReplaceManyOptions,
    write_concern: Option<&Bson>,
) -> Document {
    let mut command = doc! {
        "update": collection,
        "updates": statements,
        "ordered": options.is_ordered(),
    };
    if let Some(bypass) = options.bypass_document_validation {
        command.insert("bypassDocumentValidation", bypass);
    }
    if let Some(write_concern) = write_concern {
        command.insert("writeConcern", write_concern.clone());
    }
    if let Some(comment) = &options.comment {
        command.insert("comment", comment.clone());
    }
    command
}

fn as_count(value: Option<&Bson>) -> u64 {
    match value {
        Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Double(n)) if *n >= 0.0 => *n as u64,
        _ => 0,
    }
}

fn as_index(value: Option<&Bson>) -> usize {
    usize::try_from(as_count(value)).unwrap_or(0)
}
