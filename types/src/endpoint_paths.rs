// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

/// Public endpoints
pub const ENDPOINT_ROOT: &str = "/";
pub const ENDPOINT_HEALTH_CHECK: &str = "/actuator/health";
pub const ENDPOINT_INFO: &str = "/actuator/info";

/// Auth endpoints
pub const ENDPOINT_AUTH_REGISTER: &str = "/api/auth/register";
pub const ENDPOINT_AUTH_LOGIN: &str = "/api/auth/login";
pub const ENDPOINT_AUTH_REFRESH: &str = "/api/auth/refresh";
pub const ENDPOINT_AUTH_LOGOUT: &str = "/api/auth/logout";
pub const ENDPOINT_AUTH_LOGOUT_ALL: &str = "/api/auth/logout-all";
pub const ENDPOINT_AUTH_ME: &str = "/api/auth/me";

/// Admin endpoints
pub const ENDPOINT_ADMIN_INVITES: &str = "/api/admin/invites";
pub const ENDPOINT_ADMIN_INVITES_REVOKE: &str = "/api/admin/invites/revoke";

/// Xtream account endpoints. The single-account routes are nested below
/// [`ENDPOINT_XTREAM`] as `/{id}` and `/{id}/test`.
pub const ENDPOINT_XTREAM: &str = "/api/xtream";

/// Path of the player API relative to an Xtream provider's base URL.
pub const XTREAM_PLAYER_API: &str = "player_api.php";
