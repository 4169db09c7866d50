//! Request images from an OpenAI-compatible generation API and save them
//! locally.
//!
//! ```no_run
//! use rdalle::{output, Config, GenerationRequest, OpenAiClient};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> rdalle::Result<()> {
//! let config = Config::from_env()?;
//! let client = OpenAiClient::new(&config)?;
//!
//! let request = GenerationRequest::new("a red bicycle").with_count(3);
//! let result = client.image().generate(&request).await?;
//!
//! let dir = output::create_run_dir(&config.output_root)?;
//! let outcomes = client
//!     .downloader()
//!     .download_all(&result.images, &dir, &CancellationToken::new())
//!     .await;
//! # let _ = outcomes;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod download;
pub mod error;
pub mod logger;
pub mod models;
pub mod openai;
pub mod output;

pub use config::Config;
pub use download::Downloader;
pub use error::{DalleError, Result};
pub use models::*;
pub use openai::{ImageClient, OpenAiClient};
