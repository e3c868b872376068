use shelf_core::tokenize::Normalizer;
use shelf_core::traits::Embedder;
use shelf_embed::HashedEmbedder;

fn main() -> anyhow::Result<()> {
    let embedder = HashedEmbedder::new(1024)?;
    let normalizer = Normalizer::default();
    let texts = ["The quick brown fox", "A lazy dog sleeps"];
    let batch: Vec<Vec<String>> = texts.iter().map(|t| normalizer.normalize(t)).collect();
    let embs = embedder.embed_batch(&batch)?;
    println!("B={} dim={} id={}", embs.len(), embedder.dim(), embedder.embedder_id());
    Ok(())
}
