//! The MVT geometry command stream.
//!
//! A geometry is encoded as a sequence of `u32`: command integers `(count << 3) | id` followed by
//! `count` zigzag-encoded coordinate deltas. All deltas of one geometry are relative to a single cursor
//! that starts at `(0, 0)` and is never reset between parts or rings.
//!
//! See <https://github.com/mapbox/vector-tile-spec/blob/master/2.1/README.md#43-geometry-encoding>.

use super::geometry_type::GeomType;
use crate::geo::Geometry;
use anyhow::{Result, bail, ensure};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use log::trace;

pub const MOVE_TO: u32 = 1;
pub const LINE_TO: u32 = 2;
pub const CLOSE_PATH: u32 = 7;

#[must_use]
pub fn command(id: u32, count: u32) -> u32 {
	(count << 3) | (id & 0x7)
}

#[must_use]
pub fn zigzag(n: i32) -> u32 {
	((n << 1) ^ (n >> 31)) as u32
}

#[must_use]
pub fn zigzag_decode(n: u32) -> i32 {
	((n >> 1) as i32) ^ -((n & 1) as i32)
}

type Point = (i32, i32);

/// Twice the signed area of a ring given without its closing coordinate. Positive for rings that turn
/// counter-clockwise in a y-up system, which is clockwise on screen.
fn ring_area(points: &[Point]) -> i64 {
	let n = points.len();
	(0..n)
		.map(|i| {
			let (a, b) = (points[i], points[(i + 1) % n]);
			i64::from(a.0) * i64::from(b.1) - i64::from(b.0) * i64::from(a.1)
		})
		.sum()
}

struct CommandEncoder {
	scale: f64,
	cursor: Point,
	commands: Vec<u32>,
}

impl CommandEncoder {
	fn new(scale: f64) -> Self {
		Self {
			scale,
			cursor: (0, 0),
			commands: Vec::new(),
		}
	}

	fn round(&self, c: &Coord<f64>) -> Point {
		((c.x * self.scale).round() as i32, (c.y * self.scale).round() as i32)
	}

	/// Rounds all coordinates, skipping those equal to their predecessor.
	fn round_distinct(&self, coords: &[Coord<f64>]) -> Vec<Point> {
		let mut points: Vec<Point> = Vec::with_capacity(coords.len());
		for c in coords {
			let p = self.round(c);
			if points.last() != Some(&p) {
				points.push(p);
			}
		}
		points
	}

	fn push_point(&mut self, p: Point) {
		self.commands.push(zigzag(p.0.wrapping_sub(self.cursor.0)));
		self.commands.push(zigzag(p.1.wrapping_sub(self.cursor.1)));
		self.cursor = p;
	}

	fn push_path(&mut self, points: &[Point]) {
		let Some((first, rest)) = points.split_first() else {
			return;
		};
		self.commands.push(command(MOVE_TO, 1));
		self.push_point(*first);
		if !rest.is_empty() {
			self.commands.push(command(LINE_TO, rest.len() as u32));
			for p in rest {
				self.push_point(*p);
			}
		}
	}

	fn points(&mut self, coords: &[Coord<f64>]) {
		if coords.is_empty() {
			return;
		}
		self.commands.push(command(MOVE_TO, coords.len() as u32));
		for c in coords {
			let p = self.round(c);
			self.push_point(p);
		}
	}

	fn line(&mut self, line: &LineString<f64>) {
		let points = self.round_distinct(&line.0);
		self.push_path(&points);
	}

	/// Encodes a ring with the requested orientation. Returns `false` and leaves the stream untouched if
	/// the ring collapses after rounding.
	fn ring(&mut self, ring: &LineString<f64>, exterior: bool) -> bool {
		let mut points = self.round_distinct(&ring.0);
		while points.len() > 1 && points.first() == points.last() {
			points.pop();
		}
		if points.len() < 3 {
			trace!("skipping ring with {} distinct points", points.len());
			return false;
		}
		let area = ring_area(&points);
		if area == 0 {
			trace!("skipping ring without area");
			return false;
		}
		if (area > 0) != exterior {
			points[1..].reverse();
		}
		self.push_path(&points);
		self.commands.push(command(CLOSE_PATH, 1));
		true
	}

	fn polygon(&mut self, polygon: &Polygon<f64>) {
		if !self.ring(polygon.exterior(), true) {
			trace!("skipping polygon with collapsed exterior ring");
			return;
		}
		for interior in polygon.interiors() {
			self.ring(interior, false);
		}
	}
}

/// Encodes `geometry`, given in tile pixels, into a command stream. `scale` maps tile pixels onto the
/// layer extent, usually `extent / tile_size`.
///
/// Coordinates are rounded half away from zero. Repeated coordinates of lines and rings are coalesced,
/// rings are written with positive area for exteriors and negative area for interiors. Rings collapsing
/// to fewer than three distinct points are left out, together with their polygon if it is the exterior.
#[must_use]
pub fn encode_geometry(geometry: &Geometry, scale: f64) -> Vec<u32> {
	let mut encoder = CommandEncoder::new(scale);
	match geometry {
		Geometry::Point(point) => encoder.points(&[point.0]),
		Geometry::MultiPoint(points) => encoder.points(&points.0.iter().map(|p| p.0).collect::<Vec<_>>()),
		Geometry::LineString(line) => encoder.line(line),
		Geometry::MultiLineString(lines) => lines.0.iter().for_each(|line| encoder.line(line)),
		Geometry::Polygon(polygon) => encoder.polygon(polygon),
		Geometry::MultiPolygon(polygons) => polygons.0.iter().for_each(|polygon| encoder.polygon(polygon)),
		Geometry::GeometryCollection(_) => {}
	}
	encoder.commands
}

fn read_parts(commands: &[u32]) -> Result<Vec<Vec<Coord<f64>>>> {
	let mut parts: Vec<Vec<Coord<f64>>> = Vec::new();
	let mut part: Vec<Coord<f64>> = Vec::new();
	let (mut x, mut y) = (0i64, 0i64);

	let mut iter = commands.iter().copied();
	while let Some(value) = iter.next() {
		let id = value & 0x7;
		let count = value >> 3;
		match id {
			MOVE_TO | LINE_TO => {
				for _ in 0..count {
					if id == MOVE_TO && !part.is_empty() {
						parts.push(std::mem::take(&mut part));
					}
					let (Some(dx), Some(dy)) = (iter.next(), iter.next()) else {
						bail!("command stream ends in the middle of a coordinate");
					};
					x += i64::from(zigzag_decode(dx));
					y += i64::from(zigzag_decode(dy));
					part.push(Coord {
						x: x as f64,
						y: y as f64,
					});
				}
			}
			CLOSE_PATH => {
				ensure!(!part.is_empty(), "ClosePath command found on an empty path");
				part.push(part[0]);
			}
			_ => bail!("unknown command {id}"),
		}
	}
	if !part.is_empty() {
		parts.push(part);
	}
	Ok(parts)
}

fn signed_area(ring: &[Coord<f64>]) -> f64 {
	ring.windows(2).map(|w| w[0].x * w[1].y - w[1].x * w[0].y).sum::<f64>() / 2.0
}

/// Decodes a command stream back into a geometry in extent units.
///
/// Single parts decode into `Point`, `LineString` and `Polygon`, several parts into their multi variants.
/// Polygon rings are assigned by their winding: a ring with positive area starts a new polygon.
pub fn decode_geometry(geom_type: GeomType, commands: &[u32]) -> Result<Geometry> {
	let mut parts = read_parts(commands)?;
	ensure!(!parts.is_empty(), "{geom_type:?} geometry must not be empty");

	Ok(match geom_type {
		GeomType::Unknown => bail!("unknown geometry type"),
		GeomType::Point => {
			ensure!(parts.iter().all(|p| p.len() == 1), "points must have exactly one coordinate");
			if parts.len() == 1 {
				Geometry::Point(parts[0][0].into())
			} else {
				Geometry::MultiPoint(parts.into_iter().map(|p| geo::Point::from(p[0])).collect())
			}
		}
		GeomType::LineString => {
			if parts.len() == 1 {
				Geometry::LineString(LineString::new(parts.remove(0)))
			} else {
				Geometry::MultiLineString(parts.into_iter().map(LineString::new).collect())
			}
		}
		GeomType::Polygon => {
			let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
			for ring in parts {
				ensure!(ring.len() >= 4, "polygon rings must have at least four coordinates");
				let area = signed_area(&ring);
				if area > 0.0 {
					polygons.push((LineString::new(ring), Vec::new()));
				} else if area < 0.0 {
					match polygons.last_mut() {
						Some((_, interiors)) => interiors.push(LineString::new(ring)),
						None => trace!("dropping interior ring without preceding exterior ring"),
					}
				} else {
					trace!("dropping ring without area");
				}
			}
			let mut polygons: Vec<Polygon<f64>> = polygons
				.into_iter()
				.map(|(exterior, interiors)| Polygon::new(exterior, interiors))
				.collect();
			match polygons.len() {
				0 => bail!("polygon geometry without exterior ring"),
				1 => Geometry::Polygon(polygons.remove(0)),
				_ => Geometry::MultiPolygon(MultiPolygon::new(polygons)),
			}
		}
	})
}
