//! Run one virtual try-on and print the JSON reply.
//!
//! Requires `FAL_KEY` (or `FAL_API_KEY`) in the environment.
//!
//! ```sh
//! cargo run --example generate -- <portrait-url> <garment-url> [direct|queue] [top|bottom|dress|undergarment]
//! ```

use tracing_subscriber::EnvFilter;
use tryon_rs::{
    FitPreference, GarmentCategory, Gender, GenerationRequest, ImageSource, Provider,
    TryOnClient, TryOnConfig,
};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("usage: generate <portrait-url> <garment-url> [direct|queue] [category]");
        return Ok(());
    }

    let provider: Provider = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(Provider::Direct);
    let category: GarmentCategory = match args.get(3) {
        Some(s) => serde_json::from_value(serde_json::Value::String(s.clone()))?,
        None => GarmentCategory::Top,
    };

    let request = GenerationRequest::new(ImageSource::url(&args[0]), ImageSource::url(&args[1]))
        .gender(Gender::Unisex)
        .garment_category(category)
        .fit_preference(FitPreference::Regular)
        .provider(provider);

    let client = TryOnClient::new(TryOnConfig::from_env());
    let reply = client.generate(&request).await;
    println!("{}", serde_json::to_string_pretty(&reply)?);

    Ok(())
}
