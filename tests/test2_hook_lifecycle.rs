use std::sync::Arc;

use mongo_hook::prelude::*;

fn unreachable_record(conn_id: &str) -> Connection {
    // nothing listens on port 1; keep server selection short so the failure is quick
    Connection::new(conn_id, "mongo")
        .with_host("127.0.0.1")
        .with_port(1)
        .with_schema("lifecycle")
        .with_extra("serverSelectionTimeoutMS", 200)
        .with_extra("connectTimeoutMS", 200)
}

#[tokio::test]
async fn test2_builder_resolves_through_chained_stores() -> Result<(), MongoHookError> {
    let primary = InMemoryConnectionStore::new();
    let fallback = InMemoryConnectionStore::new().with_connection(unreachable_record("etl"));
    let store = ChainConnectionStore::new()
        .with_store(primary)
        .with_store(fallback);

    let hook = MongoHookOptionsBuilder::new("etl")
        .app_name("nightly-etl")
        .build(&store)
        .await?;
    assert_eq!(hook.conn_id(), "etl");
    assert_eq!(hook.uri(), "mongodb://127.0.0.1:1/lifecycle");
    assert!(!hook.is_connected());

    let client = hook.get_conn().await?;
    assert_eq!(
        client.default_database().map(|db| db.name().to_string()),
        Some("lifecycle".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test2_concurrent_first_use_creates_one_client() -> Result<(), MongoHookError> {
    let hook = Arc::new(MongoHook::from_connection(unreachable_record("shared"))?);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let hook = Arc::clone(&hook);
        handles.push(tokio::spawn(async move {
            hook.get_conn().await.map(|c| c as *const _ as usize)
        }));
    }

    let mut addresses = Vec::new();
    for handle in handles {
        addresses.push(handle.await.expect("task panicked")?);
    }
    addresses.dedup();
    assert_eq!(addresses.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test2_close_then_reopen() -> Result<(), MongoHookError> {
    let mut hook = MongoHook::from_connection(unreachable_record("reopen"))?;

    hook.close().await;
    assert!(!hook.is_connected());

    hook.get_conn().await?;
    assert!(hook.is_connected());
    hook.close().await;
    assert!(!hook.is_connected());

    hook.get_conn().await?;
    assert!(hook.is_connected());
    Ok(())
}

#[tokio::test]
async fn test2_test_connection_reports_failure() -> Result<(), MongoHookError> {
    let hook = MongoHook::from_connection(unreachable_record("down"))?;
    let (ok, message) = hook.test_connection().await;
    assert!(!ok);
    assert!(!message.is_empty());

    let err = hook.ping().await.unwrap_err();
    assert!(err.is_driver_error());
    Ok(())
}

#[tokio::test]
async fn test2_collection_defaults_to_schema() -> Result<(), MongoHookError> {
    let hook = MongoHook::from_connection(unreachable_record("coll"))?;

    let default_db = hook.get_collection("jobs", None).await?;
    assert_eq!(default_db.namespace().db, "lifecycle");
    assert_eq!(default_db.name(), "jobs");

    let other_db = hook.get_collection("jobs", Some("archive")).await?;
    assert_eq!(other_db.namespace().db, "archive");
    Ok(())
}

#[tokio::test]
async fn test2_collection_without_any_database_fails() -> Result<(), MongoHookError> {
    let hook = MongoHook::from_connection(Connection::new("nodb", "mongo").with_host("127.0.0.1"))?;
    let err = hook.get_collection("jobs", None).await.unwrap_err();
    assert!(matches!(err, MongoHookError::ConfigError(_)));
    Ok(())
}
