//! Clean command orchestration.
//!
//! "Cleaning" never deletes: the output directory is renamed to the first
//! free `<dir>_bakN` so a bad run can always be inspected afterward.
//! Renames retry with a short sleep; directory moves can fail transiently
//! while another process still holds a handle under the tree.

use std::fs;
use std::io;
use std::path::Path;

use goldbatch_log::Logger;
use goldbatch_pool::{norm_abspath, Sleeper};

use crate::cli::CleanArgs;

use super::{CommandError, CommandResult};

const RENAME_RETRY_LIMIT: u32 = 20;
const RENAME_RETRY_SLEEP_MS: u64 = 100;

/// Execute the clean command.
pub fn execute_clean<P, L>(args: &CleanArgs, sleeper: &P, logger: &L) -> CommandResult<()>
where
    P: Sleeper,
    L: Logger + ?Sized,
{
    args.validate()?;

    let out_path = norm_abspath(&args.out_dir);
    logger.status(&format!("Cleaning \"{}\"", out_path));
    if !Path::new(&out_path).exists() {
        logger.status("Already clean.");
        return Ok(());
    }

    let backup_path = first_free_backup(&out_path);
    logger.status(&format!("Moving \"{}\" --> \"{}\"", out_path, backup_path));
    rename_with_retry(&out_path, &backup_path, sleeper, logger).map_err(|source| {
        CommandError::Clean {
            path: out_path,
            source,
        }
    })
}

fn first_free_backup(out_path: &str) -> String {
    let mut index = 0;
    loop {
        let candidate = format!("{}_bak{}", out_path, index);
        if !Path::new(&candidate).exists() {
            return candidate;
        }
        index += 1;
    }
}

fn rename_with_retry<P, L>(from: &str, to: &str, sleeper: &P, logger: &L) -> io::Result<()>
where
    P: Sleeper,
    L: Logger + ?Sized,
{
    let mut last_error = None;
    for retry in 0..RENAME_RETRY_LIMIT {
        if retry > 0 {
            sleeper.sleep_ms(RENAME_RETRY_SLEEP_MS);
            logger.warn(&format!(
                "Retrying failed rename: \"{}\" --> \"{}\"",
                from, to
            ));
        }
        match fs::rename(from, to) {
            Ok(()) => return Ok(()),
            Err(err) => last_error = Some(err),
        }
    }
    Err(last_error.unwrap_or_else(|| io::Error::other("rename failed")))
}
