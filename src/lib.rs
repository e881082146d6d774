//! # tryon-rs
//!
//! Async Rust client for virtual try-on on [fal.ai](https://fal.ai): send a
//! portrait and a garment image, get back the URL of the synthesized image.
//!
//! Two providers are supported behind one call:
//!
//! - **Direct** (`fal-ai/fashn/tryon`) answers in a single request and is
//!   steered by a garment category and a quality mode.
//! - **Queue** (`fal-ai/nano-banana/edit`) is prompt-driven and runs on fal's
//!   job queue; the client submits, polls status at a fixed interval up to
//!   an attempt ceiling, then fetches the result.
//!
//! Either way the response is probed for the output image across the shapes
//! fal models are known to return, and failures come back as a
//! [`TryOnError`] with a stable [`ErrorKind`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use tryon_rs::{
//!     FitPreference, GarmentCategory, Gender, GenerationRequest, ImageSource, Provider,
//!     TryOnClient, TryOnConfig,
//! };
//!
//! # async fn example() -> tryon_rs::Result<()> {
//! let client = TryOnClient::new(TryOnConfig::from_env());
//!
//! let request = GenerationRequest::new(
//!     ImageSource::url("https://example.com/portrait.jpg"),
//!     ImageSource::url("https://example.com/jeans.jpg"),
//! )
//! .gender(Gender::Female)
//! .garment_category(GarmentCategory::Bottom)
//! .fit_preference(FitPreference::Loose)
//! .provider(Provider::Queue);
//!
//! let result = client.execute(&request).await?;
//! println!("{} via {}", result.image_url, result.provider_used);
//! # Ok(())
//! # }
//! ```
//!
//! ## Prompt synthesis
//!
//! Prompts are a pure function of the request's preferences:
//!
//! ```rust
//! use tryon_rs::{synthesize, FitPreference, GarmentCategory, Gender};
//!
//! let bundle = synthesize(Gender::Male, GarmentCategory::Top, FitPreference::Tight);
//! assert!(bundle.prompt.contains("man"));
//! assert!(bundle.negative_prompt.contains("bad anatomy"));
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod prompt;
pub mod provider;
pub mod transport;
pub mod types;

pub use client::{Sleeper, TokioSleeper, TryOnClient};
pub use config::{TryOnConfig, TryOnConfigBuilder};
pub use error::{ErrorKind, Result, TryOnError};
pub use extract::extract_image_url;
pub use prompt::synthesize;
pub use provider::{DirectProvider, ProviderAdapter, QueueProvider, Submission};
pub use transport::{HttpReply, HttpTransport, Transport};
pub use types::{
    FitPreference, GarmentCategory, Gender, GenerationRequest, GenerationResponse,
    GenerationResult, ImageSource, JobHandle, JobStatus, PromptBundle, Provider,
};
