use anyhow::Result;
use forkgres_orchestrations::client::{ApiCredentials, CloudClient};
use forkgres_orchestrations::orchestrations::fork_instance::fork_instance_orchestration;
use forkgres_orchestrations::outputs::{FileOutputSink, OutputSink, StdoutOutputSink};
use forkgres_orchestrations::redact::register_secret;
use forkgres_orchestrations::state::FileStateStore;
use forkgres_orchestrations::{ForkInstanceInput, ForkServiceInput};

use crate::cli::ForkArgs;
use crate::config::{Config, ForkSettings};

pub async fn run_fork(config: &Config, args: ForkArgs) -> Result<()> {
    register_secret(&args.api_key);
    let settings = ForkSettings::load()?;
    let credentials: ApiCredentials = args.api_key.parse()?;

    let api = CloudClient::new(&config.api_url, credentials.clone());
    let mut store = FileStateStore::new(&config.state_file);
    let mut sink: Box<dyn OutputSink> = match &config.output_file {
        Some(path) => Box::new(FileOutputSink::new(path)),
        None => Box::new(StdoutOutputSink),
    };

    let input = ForkInstanceInput {
        fork: ForkServiceInput {
            project_id: args.project_id,
            service_id: args.service_id,
            strategy: args.strategy,
            target_time: args.target_time,
            name: args.name,
            cpu: args.cpu,
            memory: args.memory,
            sizing_policy: settings.sizing_policy,
        },
        credentials,
        cleanup: args.cleanup,
    };

    let output = fork_instance_orchestration(&api, &mut store, sink.as_mut(), &input, settings.poll).await?;

    tracing::info!("✓ Fork ready");
    tracing::info!("  Service ID: {}", output.service_id);
    tracing::info!("  Name:       {}", output.name);
    if let (Some(host), Some(port)) = (&output.host, output.port) {
        tracing::info!("  Endpoint:   {}:{}", host, port);
    }
    tracing::info!("  Ready in:   {}s", output.deployment_time_seconds);
    if input.cleanup {
        tracing::info!(
            "  Cleanup:    recorded in {} (run `forkgres cleanup` to delete)",
            store.path().display()
        );
    }
    for advisory in &output.advisories {
        tracing::warn!("  Note: {}", advisory);
    }

    Ok(())
}
