// Copyright 2025 HEM Sp. z o.o.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::Parser;
use env_logger::Env;
use log::{error, info};
use playsync_native_service::cli::Cli;
use playsync_native_service::{run_host, write_outputs};
use tokio::io::BufReader;
use tokio::sync::mpsc::unbounded_channel;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol, so logs stay on stderr.
    let env = Env::default()
        .filter_or("PLAYSYNC_LOG", cli.log_level.to_string())
        .write_style("PLAYSYNC_LOG_STYLE");
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .init();

    let (output, outputs) = unbounded_channel();
    let writer = tokio::spawn(write_outputs(tokio::io::stdout(), outputs));

    let host = run_host(cli.host_options(), BufReader::new(tokio::io::stdin()), output);
    tokio::select! {
        result = host => {
            if let Err(e) = &result {
                error!("Host error: {}", e);
            }
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, exiting");
            return Ok(());
        }
    }

    writer.await??;
    info!("Exit.");
    Ok(())
}
