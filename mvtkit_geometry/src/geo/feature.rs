use super::{GeoProperties, GeoValue, Geometry};

/// A geometry together with its attributes, as handed over by a data source.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoFeature {
	pub geometry: Geometry,
	pub properties: GeoProperties,
}

impl GeoFeature {
	#[must_use]
	pub fn new(geometry: Geometry) -> Self {
		Self {
			geometry,
			properties: GeoProperties::new(),
		}
	}

	#[must_use]
	pub fn with_properties(geometry: Geometry, properties: GeoProperties) -> Self {
		Self { geometry, properties }
	}

	pub fn set_property<T>(&mut self, key: &str, value: T)
	where
		GeoValue: From<T>,
	{
		self.properties.insert(key.to_string(), GeoValue::from(value));
	}

	#[cfg(test)]
	pub fn new_example() -> Self {
		Self {
			geometry: Geometry::new_example(),
			properties: GeoProperties::from(vec![
				("name", GeoValue::from("Nice")),
				("population", GeoValue::from(348_085)),
				("is_nice", GeoValue::from(true)),
			]),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn set_property() {
		let mut feature = GeoFeature::new(Geometry::new_point([1.0, 2.0]));
		feature.set_property("name", "x");
		feature.set_property("rank", 3u32);
		assert_eq!(feature.properties.get("rank"), Some(&GeoValue::UInt(3)));
		assert_eq!(feature.properties.len(), 2);
	}

	#[test]
	fn example() {
		let feature = GeoFeature::new_example();
		assert_eq!(feature.geometry.type_name(), "MultiPolygon");
		assert_eq!(feature, GeoFeature::with_properties(Geometry::new_example(), feature.properties.clone()));
	}
}
