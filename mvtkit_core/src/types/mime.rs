//! MIME types under which Mapbox Vector Tiles are requested and served.

/// The registered MIME type, used when producing output.
pub const MVT_MIME_TYPE: &str = "application/vnd.mapbox-vector-tile";

/// Every MIME type recognized as a request for a Mapbox Vector Tile.
pub const MVT_MIME_TYPES: [&str; 5] = [
	"application/x-protobuf",
	"application/vnd.mapbox-vector-tile",
	"application/pbf",
	"application/mvt",
	"application/x-protobuf;type=mapbox-vector",
];

/// Returns `true` if `mime` names a vector tile format.
///
/// Comparison ignores ASCII case and whitespace around parameters, so
/// `"Application/X-Protobuf; type=mapbox-vector"` is accepted.
#[must_use]
pub fn is_mvt_mime(mime: &str) -> bool {
	let normalized = mime
		.split(';')
		.map(|part| part.trim().to_ascii_lowercase())
		.collect::<Vec<String>>()
		.join(";");
	MVT_MIME_TYPES.contains(&normalized.as_str())
}
