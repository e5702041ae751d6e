// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: GPL-3.0-only

fn main() {
    jellyfin_time_limiter::cmd::run();
}
