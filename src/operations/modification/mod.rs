mod delete_polygon;

pub use delete_polygon::DeletePolygon;
