//! # Letterbox
//!
//! An on-demand thumbnail server. Ask for a source image at a width and
//! height, get back a JPEG of exactly that size: scaled down when the source
//! is larger, padded with a solid background when it is smaller, never
//! cropped and never upsampled.
//!
//! ```text
//! GET /thumbnail?url=https://example.com/a.jpg&width=500&height=300
//! ```
//!
//! # Architecture
//!
//! ```text
//! server ──→ transform::Transformer ──→ cache::CacheManager ──→ remote::ObjectStore (S3)
//!                 │          │
//!                 │          └──→ imaging (plan + resize + pad + encode)
//!                 └──→ fetch::Fetcher (HTTP / local files)
//! ```
//!
//! Each collaborator sits behind a trait (`Fetcher`, `ImageBackend`,
//! `ObjectStore`) so the request pipeline is tested against mocks with no
//! network and no pixel work.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`transform`] | Request validation and the fetch, letterbox, cache pipeline |
//! | [`cache`] | Bounded FIFO local tier over a durable remote tier |
//! | [`imaging`] | Letterbox planning and pixel operations on the `image` crate |
//! | [`naming`] | Cache key derivation from `(source, width, height)` |
//! | [`fetch`] | Source download over HTTP(S) or from the local filesystem |
//! | [`remote`] | Object store trait with S3 and in-memory implementations |
//! | [`server`] | axum router for `GET /thumbnail` and JSON errors |
//! | [`config`] | `letterbox.toml` loading, validation, and merging |
//!
//! # Design Decisions
//!
//! ## Letterbox, Never Upsample
//!
//! When the requested box is larger than the source on some axis the source
//! keeps its native resolution on that axis and the remainder is filled with
//! the background color, centered. Upsampling would produce a blurry image
//! at the requested size; padding keeps every delivered pixel real. See
//! [`imaging::plan_letterbox`] for the four cases.
//!
//! ## Two Cache Tiers
//!
//! The local tier holds a handful of decoded bitmaps and exists to make
//! repeated requests for the same thumbnail free. The remote tier keeps the
//! encoded JPEG of everything ever produced, so a restarted server or an
//! evicted entry costs one object-store read instead of a source fetch.
//!
//! ## Readable Cache Keys
//!
//! Keys are the sanitized source URL plus dimensions, not a hash, so the
//! bucket can be browsed and purged by hand. See [`naming`].
//!
//! ## Single Output Format
//!
//! Every thumbnail is JPEG. Thumbnails are photographic and small, and a
//! single format keeps cache keys and content types fixed.

pub mod cache;
pub mod config;
pub mod fetch;
pub mod imaging;
pub mod naming;
pub mod remote;
pub mod server;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_helpers;
