//! Bulk Load Example
//!
//! Creates a handful of documents through the bulk API, then searches,
//! counts and aggregates them.
//!
//! Run against a local server with: cargo run --example bulk_load

use esclient_rs::{ClientConfig, ElasticClient, DEFAULT_MAX_HITS};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("esclient Bulk Load Example\n");

    let mut client = ElasticClient::new(ClientConfig::new("http://localhost:9200"))?;
    // Small batches so the example exercises more than one request
    client.set_bulk_batch_size(2)?;

    let index = "esclient-example-books";
    let documents = [
        r#"{"title":"Dune","genre":"scifi","year":1965}"#,
        r#"{"title":"Hyperion","genre":"scifi","year":1989}"#,
        r#"{"title":"Emma","genre":"classic","year":1815}"#,
        r#"{"title":"Neuromancer","genre":"scifi","year":1984}"#,
        r#"{"title":"Persuasion","genre":"classic","year":1817}"#,
    ];

    let ids = client.bulk_create(index, &documents).await?;
    println!("📝 Created {} documents", ids.len());
    for (doc, id) in documents.iter().zip(&ids) {
        println!("   {} -> {}", id, doc);
    }

    // Newly indexed documents become searchable after the next refresh
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;

    let results = client
        .match_query(index, Some("genre"), Some("scifi"), Some(DEFAULT_MAX_HITS))
        .await?;
    println!("\n🔍 {} scifi books:", results.total);
    for (i, hit) in results.hits.iter().enumerate() {
        println!("   {}. {} (score: {:.4})", i + 1, hit.source(), hit.score);
    }

    let total = client.count(index, None, None).await?;
    println!("\n📊 {} documents in {}", total, index);

    let genres = client.simple_aggregate(index, "genre").await?;
    for (genre, count) in &genres {
        println!("   {}: {}", genre, count);
    }

    let mapping = client.mappings(index).await?;
    println!("\n🗂  Mapping:");
    for (field, field_type) in &mapping {
        println!("   {}: {}", field, field_type);
    }

    client.delete_all_docs(index).await?;
    println!("\n✅ Cleaned up {}", index);

    Ok(())
}
