// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Types shared between the rptv server and its clients.

pub mod endpoint_paths;
pub mod identifiers;
pub mod messages;
pub mod validation;

/// Header carrying the correlation id of a request. Echoed on every response.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Name reported by the root and info endpoints.
pub const APP_NAME: &str = "reverse-proxy-tv";
