use std::env;

use anyhow::{Context, Error};

use crate::mirror::fsops;
use crate::mirror::sender::RequestSender;
use crate::mirror::{Mirror, MirrorOptions};
use crate::Args;

/// The name of the cargo package.
const NAME: &str = env!("CARGO_PKG_NAME");

/// The version of the cargo package.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable consulted when `--password` is not given.
const PASSWORD_ENV: &str = "ALIST_PASSWORD";

/// Handles the flow of one mirroring run: authenticate, walk, drain the
/// download pool, report, and unstage if a temp directory was used.
pub(crate) struct Program {
    args: Args,
}

impl Program {
    pub(crate) fn new(args: Args) -> Self {
        Self { args }
    }

    pub(crate) async fn run(self) -> Result<(), Error> {
        trace!("Starting {}...", NAME);
        trace!("Program Version: {}", VERSION);
        let args = self.args;

        let password = match args.password {
            Some(password) => password,
            None => env::var(PASSWORD_ENV)
                .with_context(|| format!("no --password given and {PASSWORD_ENV} is unset"))?,
        };

        let sender = RequestSender::new(&args.host)?;
        // Bad credentials abort the run before any walk begins.
        let token = sender.login(&args.username, &password).await?;
        info!("authenticated against {}", args.host);

        let staging = if args.use_temp {
            info!("staging into {}", args.tmp_dir.display());
            &args.tmp_dir
        } else {
            &args.local_path
        };

        let mirror = Mirror::new(
            sender,
            token,
            args.threads.max(1),
            MirrorOptions {
                overwrite_strm: args.overwrite_strm,
                fetch_sign: args.fetch_sign,
            },
        );
        let failures = mirror.run(&args.remote_path, staging).await;

        if failures.is_empty() {
            info!("mirror completed, no failed downloads");
        } else {
            warn!("mirror completed with {} failed download(s):", failures.len());
            for failure in &failures {
                warn!(
                    "  {} -> {}: {}",
                    failure.url,
                    failure.dest.display(),
                    failure.reason
                );
            }
        }

        if args.use_temp {
            info!("copying staged tree into {}", args.local_path.display());
            fsops::copy_tree(&args.tmp_dir, &args.local_path)?;
        }

        Ok(())
    }
}
