//! Function entry point: one generator per process, one trigger per
//! invocation.

use clip_variants::{
    FfmpegEngine, GeneratorConfig, InvocationResult, S3ObjectStore, Trigger, VariantGenerator,
    ffmpeg,
};
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use tracing_subscriber::EnvFilter;

type Generator = VariantGenerator<S3ObjectStore, FfmpegEngine>;

async fn function_handler(
    event: LambdaEvent<Trigger>,
    generator: &Generator,
) -> Result<InvocationResult, Error> {
    log::debug!("Invocation {}", event.context.request_id);
    Ok(generator.handle(&event.payload).await?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .without_time()
        .init();

    let config = GeneratorConfig::from_env()?;
    ffmpeg::initialize(config.ffmpeg_log_level())?;

    let store = S3ObjectStore::from_env().await;
    let engine = config.ffmpeg_engine();
    let generator = VariantGenerator::new(store, engine, config);

    run(service_fn(|event: LambdaEvent<Trigger>| {
        function_handler(event, &generator)
    }))
    .await
}
