use crate::activity::{Activity, ActivityTable};

/// A canonical construction phase used by the keyword fallback and the
/// default project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub duration_days: i64,
    pub triggers: &'static [&'static str],
}

/// Phases in canonical build order. Triggers are matched as lowercase substrings.
pub static CATEGORIES: [Category; 7] = [
    Category {
        name: "Excavation",
        duration_days: 5,
        triggers: &[
            "excavación",
            "excavacion",
            "excavar",
            "excavado",
            "movimiento de tierras",
            "excavation",
            "excavate",
            "earthwork",
            "digging",
        ],
    },
    Category {
        name: "Foundation",
        duration_days: 10,
        triggers: &[
            "cimentación",
            "cimentacion",
            "cimientos",
            "fundación",
            "fundaciones",
            "foundation",
            "footing",
        ],
    },
    Category {
        name: "Structure",
        duration_days: 15,
        triggers: &[
            "estructura",
            "columnas",
            "vigas",
            "losas",
            "structure",
            "structural",
            "framing",
            "columns",
            "beams",
            "slabs",
        ],
    },
    Category {
        name: "Walls",
        duration_days: 8,
        triggers: &[
            "muros",
            "paredes",
            "tabiques",
            "albañilería",
            "walls",
            "masonry",
            "partitions",
        ],
    },
    Category {
        name: "Roofing",
        duration_days: 6,
        triggers: &["techo", "cubierta", "roof", "roofing"],
    },
    Category {
        name: "Utilities",
        duration_days: 12,
        triggers: &[
            "instalaciones",
            "plomería",
            "plomeria",
            "electricidad",
            "gas",
            "utilities",
            "plumbing",
            "electrical",
            "wiring",
        ],
    },
    Category {
        name: "Finishing",
        duration_days: 10,
        triggers: &[
            "acabados",
            "pintura",
            "pisos",
            "revestimientos",
            "finishing",
            "finishes",
            "painting",
            "flooring",
            "cladding",
        ],
    },
];

pub fn category(name: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.name == name)
}

/// Chains the given categories, each waiting on the closest earlier one
/// present, in canonical order.
pub fn chain_categories<'a, I>(categories: I) -> ActivityTable
where
    I: IntoIterator<Item = &'a Category>,
{
    let mut previous: Option<&str> = None;
    let mut table = ActivityTable::new();
    for category in categories {
        let mut activity = Activity::new(category.name, category.duration_days);
        if let Some(pred) = previous {
            activity.predecessors = vec![pred.to_string()];
        }
        previous = Some(category.name);
        table.push(activity);
    }
    table
}

/// The seven-phase fallback project: excavation through finishing, each
/// phase waiting on the one before.
pub fn default_project() -> ActivityTable {
    chain_categories(CATEGORIES.iter())
}

/// Demo sentence used when the caller asks for an example project.
pub const EXAMPLE_PROMPT: &str =
    "Build a two-storey house with excavation, foundation, structure and finishing.";
