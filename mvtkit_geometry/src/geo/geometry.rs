use anyhow::Result;
use geo::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use std::fmt::Debug;

/// A feature geometry.
///
/// The set of variants is closed: every stage of the encoding pipeline matches on it exhaustively.
/// Geometries are plain values; transformations always build a new geometry.
#[derive(Clone, PartialEq)]
pub enum Geometry {
	Point(Point<f64>),
	MultiPoint(MultiPoint<f64>),
	LineString(LineString<f64>),
	MultiLineString(MultiLineString<f64>),
	Polygon(Polygon<f64>),
	MultiPolygon(MultiPolygon<f64>),
	GeometryCollection(Vec<Geometry>),
}

fn to_line_string(coords: Vec<[f64; 2]>) -> LineString<f64> {
	LineString::new(coords.into_iter().map(|[x, y]| Coord { x, y }).collect())
}

fn to_polygon(rings: Vec<Vec<[f64; 2]>>) -> Polygon<f64> {
	let mut rings = rings.into_iter().map(to_line_string);
	let exterior = rings.next().unwrap_or_else(|| LineString::new(vec![]));
	Polygon::new(exterior, rings.collect())
}

impl Geometry {
	#[must_use]
	pub fn new_point(value: [f64; 2]) -> Self {
		Self::Point(Point::new(value[0], value[1]))
	}

	#[must_use]
	pub fn new_multi_point(value: Vec<[f64; 2]>) -> Self {
		Self::MultiPoint(MultiPoint::new(
			value.into_iter().map(|[x, y]| Point::new(x, y)).collect(),
		))
	}

	#[must_use]
	pub fn new_line_string(value: Vec<[f64; 2]>) -> Self {
		Self::LineString(to_line_string(value))
	}

	#[must_use]
	pub fn new_multi_line_string(value: Vec<Vec<[f64; 2]>>) -> Self {
		Self::MultiLineString(MultiLineString::new(value.into_iter().map(to_line_string).collect()))
	}

	/// Creates a polygon from its exterior ring followed by any interior rings. Rings are closed automatically.
	#[must_use]
	pub fn new_polygon(value: Vec<Vec<[f64; 2]>>) -> Self {
		Self::Polygon(to_polygon(value))
	}

	#[must_use]
	pub fn new_multi_polygon(value: Vec<Vec<Vec<[f64; 2]>>>) -> Self {
		Self::MultiPolygon(MultiPolygon::new(value.into_iter().map(to_polygon).collect()))
	}

	#[must_use]
	pub fn type_name(&self) -> &'static str {
		match self {
			Geometry::Point(_) => "Point",
			Geometry::MultiPoint(_) => "MultiPoint",
			Geometry::LineString(_) => "LineString",
			Geometry::MultiLineString(_) => "MultiLineString",
			Geometry::Polygon(_) => "Polygon",
			Geometry::MultiPolygon(_) => "MultiPolygon",
			Geometry::GeometryCollection(_) => "GeometryCollection",
		}
	}

	/// Total number of coordinates, including the closing coordinates of polygon rings.
	#[must_use]
	pub fn coord_count(&self) -> usize {
		fn polygon(p: &Polygon<f64>) -> usize {
			p.exterior().0.len() + p.interiors().iter().map(|r| r.0.len()).sum::<usize>()
		}
		match self {
			Geometry::Point(_) => 1,
			Geometry::MultiPoint(g) => g.0.len(),
			Geometry::LineString(g) => g.0.len(),
			Geometry::MultiLineString(g) => g.0.iter().map(|l| l.0.len()).sum(),
			Geometry::Polygon(g) => polygon(g),
			Geometry::MultiPolygon(g) => g.0.iter().map(polygon).sum(),
			Geometry::GeometryCollection(g) => g.iter().map(Geometry::coord_count).sum(),
		}
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.coord_count() == 0
	}

	/// Returns a new geometry with `f` applied to every coordinate. Stops at the first error.
	pub fn try_map_coords<F>(&self, f: &F) -> Result<Geometry>
	where
		F: Fn(Coord<f64>) -> Result<Coord<f64>>,
	{
		let line = |l: &LineString<f64>| -> Result<LineString<f64>> {
			Ok(LineString::new(l.0.iter().map(|c| f(*c)).collect::<Result<Vec<_>>>()?))
		};
		let polygon = |p: &Polygon<f64>| -> Result<Polygon<f64>> {
			Ok(Polygon::new(
				line(p.exterior())?,
				p.interiors().iter().map(line).collect::<Result<Vec<_>>>()?,
			))
		};
		Ok(match self {
			Geometry::Point(g) => Geometry::Point(Point::from(f(g.0)?)),
			Geometry::MultiPoint(g) => Geometry::MultiPoint(MultiPoint::new(
				g.0.iter().map(|p| Ok(Point::from(f(p.0)?))).collect::<Result<Vec<_>>>()?,
			)),
			Geometry::LineString(g) => Geometry::LineString(line(g)?),
			Geometry::MultiLineString(g) => {
				Geometry::MultiLineString(MultiLineString::new(g.0.iter().map(line).collect::<Result<Vec<_>>>()?))
			}
			Geometry::Polygon(g) => Geometry::Polygon(polygon(g)?),
			Geometry::MultiPolygon(g) => {
				Geometry::MultiPolygon(MultiPolygon::new(g.0.iter().map(polygon).collect::<Result<Vec<_>>>()?))
			}
			Geometry::GeometryCollection(g) => Geometry::GeometryCollection(
				g.iter().map(|c| c.try_map_coords(f)).collect::<Result<Vec<_>>>()?,
			),
		})
	}

	#[cfg(test)]
	pub fn new_example() -> Self {
		Self::new_multi_polygon(vec![
			vec![
				vec![[0.0, 0.0], [5.0, 0.0], [2.5, 4.0], [0.0, 0.0]],
				vec![[2.0, 1.0], [2.5, 2.0], [3.0, 1.0], [2.0, 1.0]],
			],
			vec![
				vec![[6.0, 0.0], [9.0, 0.0], [9.0, 4.0], [6.0, 4.0], [6.0, 0.0]],
				vec![[7.0, 1.0], [7.0, 3.0], [8.0, 3.0], [8.0, 1.0], [7.0, 1.0]],
			],
		])
	}
}

impl Debug for Geometry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let line = |l: &LineString<f64>| l.0.iter().map(|c| [c.x, c.y]).collect::<Vec<_>>();
		let rings = |p: &Polygon<f64>| {
			std::iter::once(p.exterior())
				.chain(p.interiors())
				.map(line)
				.collect::<Vec<_>>()
		};
		match self {
			Geometry::Point(g) => f.debug_tuple("Point").field(&[g.x(), g.y()]).finish(),
			Geometry::MultiPoint(g) => f
				.debug_tuple("MultiPoint")
				.field(&g.0.iter().map(|p| [p.x(), p.y()]).collect::<Vec<_>>())
				.finish(),
			Geometry::LineString(g) => f.debug_tuple("LineString").field(&line(g)).finish(),
			Geometry::MultiLineString(g) => f
				.debug_tuple("MultiLineString")
				.field(&g.0.iter().map(line).collect::<Vec<_>>())
				.finish(),
			Geometry::Polygon(g) => f.debug_tuple("Polygon").field(&rings(g)).finish(),
			Geometry::MultiPolygon(g) => f
				.debug_tuple("MultiPolygon")
				.field(&g.0.iter().map(rings).collect::<Vec<_>>())
				.finish(),
			Geometry::GeometryCollection(g) => f.debug_tuple("GeometryCollection").field(g).finish(),
		}
	}
}

impl From<Polygon<f64>> for Geometry {
	fn from(value: Polygon<f64>) -> Self {
		Geometry::Polygon(value)
	}
}

impl From<LineString<f64>> for Geometry {
	fn from(value: LineString<f64>) -> Self {
		Geometry::LineString(value)
	}
}

impl From<Point<f64>> for Geometry {
	fn from(value: Point<f64>) -> Self {
		Geometry::Point(value)
	}
}
