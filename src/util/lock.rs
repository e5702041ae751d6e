// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: GPL-3.0-only

use nix::{
    errno::Errno,
    fcntl::{fcntl, FcntlArg},
};
use std::{
    fs::{self, OpenOptions},
    io,
    os::unix::{fs::OpenOptionsExt, io::AsRawFd},
    path::Path,
};

fn whole_file(l_type: libc::c_int) -> libc::flock {
    libc::flock {
        l_type: l_type as _,
        l_whence: libc::SEEK_SET as _,
        l_start: 0,
        l_len: 0,
        l_pid: 0,
    }
}

/// Set unique advisory lock on whole file. Returns `EACCES` or `EAGAIN` if
/// already locked.
pub fn setlk(file: &fs::File) -> nix::Result<()> {
    fcntl(file.as_raw_fd(), FcntlArg::F_SETLK(&whole_file(libc::F_WRLCK))).map(|_| ())
}

pub fn setlk_wait(file: &fs::File) -> nix::Result<()> {
    loop {
        let res = fcntl(file.as_raw_fd(), FcntlArg::F_SETLKW(&whole_file(libc::F_WRLCK)));
        if res != Err(Errno::EINTR) {
            return res.map(|_| ());
        }
    }
}

pub fn unlck(file: &fs::File) -> nix::Result<()> {
    fcntl(file.as_raw_fd(), FcntlArg::F_SETLK(&whole_file(libc::F_UNLCK)))?;
    Ok(())
}

/// Exclusive lock held for the lifetime of a run. Released when dropped,
/// since closing the descriptor drops its `fcntl` locks.
#[derive(Debug)]
pub struct RunLock(#[allow(dead_code)] fs::File);

/// Take the run lock at `path`. `Ok(None)` means another process holds it.
pub fn try_lock_file(path: &Path) -> io::Result<Option<RunLock>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .mode(0o644)
        .open(path)?;
    match setlk(&file) {
        Ok(()) => Ok(Some(RunLock(file))),
        Err(Errno::EACCES) | Err(Errno::EAGAIN) => Ok(None),
        Err(err) => Err(err.into()),
    }
}
