//! Transport helpers for the gRPC endpoints.

use tonic::transport::Channel;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Connect to a gRPC service by TCP address.
///
/// The address is a plain `host:port` pair; an `http://` scheme is added
/// when missing.
pub async fn connect_to_address(
    address: &str,
) -> Result<Channel, Box<dyn std::error::Error + Send + Sync>> {
    let uri = if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    };

    info!(address = %address, "Connecting to service");

    let channel = Channel::from_shared(uri)?.connect().await?;
    Ok(channel)
}

/// Tower trace layer that creates a tracing span per gRPC request.
///
/// This works at the HTTP layer, before tonic deserializes the protobuf
/// body, so every handler runs inside a request span.
pub fn grpc_trace_layer() -> TraceLayer<
    tower_http::classify::SharedClassifier<tower_http::classify::GrpcErrorsAsFailures>,
    impl Fn(&http::Request<tonic::body::BoxBody>) -> tracing::Span + Clone,
> {
    TraceLayer::new_for_grpc().make_span_with(|request: &http::Request<tonic::body::BoxBody>| {
        let path = request.uri().path();
        tracing::info_span!("grpc", %path)
    })
}
