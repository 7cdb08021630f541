// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

#![deny(unreachable_pub)]

pub mod auth_service;
pub mod crypto;
pub mod errors;
pub mod invites;
pub mod settings;
pub mod xtream;
