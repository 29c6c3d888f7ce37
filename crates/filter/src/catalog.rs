//! Dimension names and value universes for the NYC restaurant inspection data set.

/// Dimension over a record's cuisine.
pub const CUISINE: &str = "cuisine";

/// Dimension over a record's most recent inspection grade.
pub const GRADE: &str = "grade";

/// Inspection grades as published by the data set.
pub const GRADES: &[&str] = &["A", "B", "C", "Not Yet Graded", "P", "Z"];

/// Cuisines as published by the data set, including its mis-encoded duplicate
/// of "Café/Coffee/Tea".
pub const CUISINES: &[&str] = &[
	"Afghan",
	"African",
	"American",
	"Armenian",
	"Asian",
	"Australian",
	"Bagels/Pretzels",
	"Bakery",
	"Bangladeshi",
	"Barbecue",
	"Bottled beverages, including water, sodas, juices, etc.",
	"Brazilian",
	"CafÃ©/Coffee/Tea",
	"Café/Coffee/Tea",
	"Cajun",
	"Californian",
	"Caribbean",
	"Chicken",
	"Chilean",
	"Chinese",
	"Chinese/Cuban",
	"Chinese/Japanese",
	"Continental",
	"Creole",
	"Creole/Cajun",
	"Czech",
	"Delicatessen",
	"Donuts",
	"Eastern European",
	"Egyptian",
	"English",
	"Ethiopian",
	"Filipino",
	"French",
	"Fruits/Vegetables",
	"German",
	"Greek",
	"Hamburgers",
	"Hawaiian",
	"Hotdogs",
	"Hotdogs/Pretzels",
	"Ice Cream, Gelato, Yogurt, Ices",
	"Indian",
	"Indonesian",
	"Iranian",
	"Irish",
	"Italian",
	"Japanese",
	"Jewish/Kosher",
	"Juice, Smoothies, Fruit Salads",
	"Korean",
	"Latin (Cuban, Dominican, Puerto Rican, South & Central American)",
	"Mediterranean",
	"Mexican",
	"Middle Eastern",
	"Moroccan",
	"Not Listed/Not Applicable",
	"Nuts/Confectionary",
	"Other",
	"Pakistani",
	"Pancakes/Waffles",
	"Peruvian",
	"Pizza",
	"Pizza/Italian",
	"Polish",
	"Polynesian",
	"Portuguese",
	"Russian",
	"Salads",
	"Sandwiches",
	"Sandwiches/Salads/Mixed Buffet",
	"Scandinavian",
	"Seafood",
	"Soul Food",
	"Soups",
	"Soups & Sandwiches",
	"Southwestern",
	"Spanish",
	"Steak",
	"Tapas",
	"Tex-Mex",
	"Thai",
	"Turkish",
	"Vegetarian",
	"Vietnamese/Cambodian/Malaysia",
];
