//! Google Calendar service.
//!
//! [`GoogleService`] implements [`CalendarService`](crate::CalendarService)
//! on top of the Calendar API v3.
//!
//! # Authentication
//!
//! The user registers a desktop OAuth client and hands its id and secret to
//! `gcalcl auth google`. The service then:
//!
//! 1. listens on a loopback port for the redirect,
//! 2. opens the consent page with a PKCE challenge,
//! 3. exchanges the returned code for access and refresh tokens,
//! 4. stores the tokens and refreshes the access token when it expires.
//!
//! # Batching
//!
//! Quick-add and bulk delete go through the batch endpoint as a single
//! `multipart/mixed` request; see [`batch`].

pub mod batch;
mod client;
mod config;
mod oauth;
mod service;
mod tokens;

pub use client::GoogleCalendarClient;
pub use config::{GoogleConfig, OAuthCredentials};
pub use oauth::{OAuthClient, PkceFlow};
pub use service::GoogleService;
pub use tokens::{TokenInfo, TokenStorage};
