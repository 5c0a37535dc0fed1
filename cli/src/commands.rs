use std::process::ExitCode;

use futures_util::TryStreamExt;
use mongo_hook::connection::redact_options;
use mongo_hook::mongo::{options_query, uri::with_query};
use mongo_hook::prelude::*;
use mongodb::bson::{self, Bson, Document};
use mongodb::options::FindOptions;

use crate::args::{Args, Command};

pub(crate) async fn run(args: Args) -> Result<ExitCode, MongoHookError> {
    let store = EnvConnectionStore::with_prefix(args.env_prefix);

    match args.command {
        Command::Uri {
            conn_id,
            with_options,
        } => {
            let hook = MongoHook::new(&conn_id, &store).await?;
            println!("{}", display_uri(&hook, with_options)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Test { conn_id } => {
            let mut hook = MongoHook::new(&conn_id, &store).await?;
            let (ok, message) = hook.test_connection().await;
            hook.close().await;
            println!("{message}");
            Ok(if ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Find {
            conn_id,
            collection,
            db,
            filter,
            projection,
            limit,
            one,
        } => {
            let mut hook = MongoHook::new(&conn_id, &store).await?;
            let query = parse_filter(&filter)?;
            let projection = (!projection.is_empty()).then(|| Projection::from(projection));

            let printed = if one {
                let found = hook
                    .find_one(&collection, query, db.as_deref(), projection, None)
                    .await?;
                let count = usize::from(found.is_some());
                if let Some(doc) = found {
                    print_document(doc);
                }
                count
            } else {
                let mut options = FindOptions::default();
                options.limit = limit;
                let cursor = hook
                    .find(&collection, query, db.as_deref(), projection, options)
                    .await?;
                let docs: Vec<Document> = cursor.try_collect().await?;
                let count = docs.len();
                docs.into_iter().for_each(print_document);
                count
            };

            tracing::info!(conn_id = %conn_id, collection = %collection, printed, "find complete");
            hook.close().await;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Connection string for display: password masked, and with `with_options` the
/// driver options appended with secret values masked.
fn display_uri(hook: &MongoHook, with_options: bool) -> Result<String, MongoHookError> {
    let uri = redact_uri(hook.uri());
    if !with_options {
        return Ok(uri);
    }
    let query = options_query(&redact_options(&hook.client_option_map()))?;
    Ok(with_query(&uri, &query))
}

fn parse_filter(raw: &str) -> Result<Document, MongoHookError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(MongoHookError::ParameterError(format!(
            "filter must be a JSON object, got {value}"
        )));
    }
    Ok(bson::to_document(&value)?)
}

fn print_document(doc: Document) {
    println!("{}", Bson::Document(doc).into_relaxed_extjson());
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn filter_parses_objects_only() {
        assert_eq!(
            parse_filter(r#"{"status": "open", "n": 2}"#).unwrap(),
            doc! { "n": 2_i64, "status": "open" }
        );
        assert!(matches!(
            parse_filter("[1]"),
            Err(MongoHookError::ParameterError(_))
        ));
        assert!(matches!(parse_filter("{"), Err(MongoHookError::JsonError(_))));
    }

    #[test]
    fn displayed_uri_masks_password_and_secret_options() {
        let hook = MongoHook::from_connection(
            Connection::new("reporting", "mongo")
                .with_host("db")
                .with_login("svc")
                .with_password("hunter2")
                .with_schema("reports")
                .with_extra("ssl", true)
                .with_extra("tlsCertificateKeyFilePassword", "pem-pass"),
        )
        .unwrap();

        assert_eq!(
            display_uri(&hook, false).unwrap(),
            "mongodb://svc:***@db/reports"
        );
        let full = display_uri(&hook, true).unwrap();
        assert!(full.starts_with("mongodb://svc:***@db/reports?ssl=true"));
        assert!(full.contains("tlsAllowInvalidCertificates=true"));
        assert!(full.contains("tlsCertificateKeyFilePassword=%2A%2A%2A"));
        assert!(!full.contains("pem-pass"));
        assert!(!full.contains("hunter2"));
    }
}
