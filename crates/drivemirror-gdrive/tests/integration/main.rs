//! Integration tests for drivemirror-gdrive
//!
//! Uses wiremock to simulate the Google Drive v3 API and verifies
//! end-to-end behavior of listings, census, content transfer, error
//! mapping, throttling backoff, and token refresh.

mod common;
