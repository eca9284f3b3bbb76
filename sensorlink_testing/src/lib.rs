//! Utilities for exercising `sensorlink` links during tests.
//!
//! The helpers bind both ends of a link on loopback with ephemeral ports,
//! capture log output and metrics, and provide a deterministic sensor
//! source for driving a publisher.
//!
//! ```rust,no_run
//! use sensorlink::{LinkConfig, message::Message};
//! use sensorlink_testing::udp_link;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (mut publisher, mut consumer) = udp_link(&LinkConfig::default()).await?;
//! publisher.send(&Message::Pong).await?;
//! let _ = consumer.recv().await?;
//! # Ok(())
//! # }
//! ```

pub mod logging;
pub mod metrics;
pub mod net;
pub mod source;

pub use logging::{LoggerHandle, logger};
pub use metrics::{MetricsCapture, counter_value};
pub use net::{loopback_config, raw_tcp_peer, tcp_link, udp_link};
pub use source::FixedSource;
