//! Per-category attribute filter shapes.
//!
//! Search input carries one shape per category (a CPU filter can name cores
//! and socket, a monitor filter panel and refresh rate, ...). The query
//! builder never looks inside these shapes: they flatten into ordered
//! `(name, value)` pairs and every name and value is bound as a parameter.

use serde::{Deserialize, Serialize};

use crate::product::{AttrValue, Category};

/// Category-tagged attribute filter.
///
/// All fields are optional; absent fields produce no filter clause. An
/// empty shape is valid and yields a category-only search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum CategoryAttributes {
    Cpu {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cores: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threads: Option<i64>,
        /// Floor threshold: matches products whose base clock is at least
        /// the requested value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_clock: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        socket: Option<String>,
    },
    Ram {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speed: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        memory_type: Option<String>,
    },
    Gpu {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cores: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        memory_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        memory_size: Option<i64>,
    },
    Motherboard {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        socket: Option<String>,
    },
    Drive {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        read_speed: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        write_speed: Option<i64>,
    },
    Monitor {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        panel: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        refresh_rate: Option<i64>,
    },
    Keyboard {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keys_no: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_mechanical: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_rgb: Option<bool>,
    },
    Mouse {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keys_no: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_rgb: Option<bool>,
    },
}

impl CategoryAttributes {
    /// The category this shape belongs to.
    pub fn category(&self) -> Category {
        match self {
            CategoryAttributes::Cpu { .. } => Category::Cpu,
            CategoryAttributes::Ram { .. } => Category::Ram,
            CategoryAttributes::Gpu { .. } => Category::Gpu,
            CategoryAttributes::Motherboard { .. } => Category::Motherboard,
            CategoryAttributes::Drive { .. } => Category::Drive,
            CategoryAttributes::Monitor { .. } => Category::Monitor,
            CategoryAttributes::Keyboard { .. } => Category::Keyboard,
            CategoryAttributes::Mouse { .. } => Category::Mouse,
        }
    }

    /// Flattens the present fields into ordered `(name, value)` pairs for
    /// the query builder. Field order matches declaration order so the
    /// generated SQL is deterministic.
    pub fn into_pairs(self) -> Vec<(String, AttrValue)> {
        let mut pairs: Vec<(String, AttrValue)> = Vec::new();

        fn push(pairs: &mut Vec<(String, AttrValue)>, name: &str, value: Option<AttrValue>) {
            if let Some(value) = value {
                pairs.push((name.to_string(), value));
            }
        }

        match self {
            CategoryAttributes::Cpu {
                cores,
                threads,
                base_clock,
                socket,
            } => {
                push(&mut pairs, "cores", cores.map(AttrValue::Int));
                push(&mut pairs, "threads", threads.map(AttrValue::Int));
                push(&mut pairs, "base_clock", base_clock.map(AttrValue::Float));
                push(&mut pairs, "socket", socket.map(AttrValue::Text));
            }
            CategoryAttributes::Ram {
                size,
                speed,
                memory_type,
            } => {
                push(&mut pairs, "size", size.map(AttrValue::Int));
                push(&mut pairs, "speed", speed.map(AttrValue::Int));
                push(&mut pairs, "memory_type", memory_type.map(AttrValue::Text));
            }
            CategoryAttributes::Gpu {
                cores,
                memory_type,
                memory_size,
            } => {
                push(&mut pairs, "cores", cores.map(AttrValue::Int));
                push(&mut pairs, "memory_type", memory_type.map(AttrValue::Text));
                push(&mut pairs, "memory_size", memory_size.map(AttrValue::Int));
            }
            CategoryAttributes::Motherboard { socket } => {
                push(&mut pairs, "socket", socket.map(AttrValue::Text));
            }
            CategoryAttributes::Drive {
                size,
                read_speed,
                write_speed,
            } => {
                push(&mut pairs, "size", size.map(AttrValue::Int));
                push(&mut pairs, "read_speed", read_speed.map(AttrValue::Int));
                push(&mut pairs, "write_speed", write_speed.map(AttrValue::Int));
            }
            CategoryAttributes::Monitor {
                size,
                panel,
                refresh_rate,
            } => {
                push(&mut pairs, "size", size.map(AttrValue::Int));
                push(&mut pairs, "panel", panel.map(AttrValue::Text));
                push(&mut pairs, "refresh_rate", refresh_rate.map(AttrValue::Int));
            }
            CategoryAttributes::Keyboard {
                keys_no,
                size,
                is_mechanical,
                is_rgb,
            } => {
                push(&mut pairs, "keys_no", keys_no.map(AttrValue::Int));
                push(&mut pairs, "size", size.map(AttrValue::Int));
                push(&mut pairs, "is_mechanical", is_mechanical.map(AttrValue::Bool));
                push(&mut pairs, "is_rgb", is_rgb.map(AttrValue::Bool));
            }
            CategoryAttributes::Mouse { keys_no, is_rgb } => {
                push(&mut pairs, "keys_no", keys_no.map(AttrValue::Int));
                push(&mut pairs, "is_rgb", is_rgb.map(AttrValue::Bool));
            }
        }

        pairs
    }

    /// An empty (category-only) shape for the given category.
    pub fn empty(category: Category) -> Self {
        match category {
            Category::Cpu => CategoryAttributes::Cpu {
                cores: None,
                threads: None,
                base_clock: None,
                socket: None,
            },
            Category::Ram => CategoryAttributes::Ram {
                size: None,
                speed: None,
                memory_type: None,
            },
            Category::Gpu => CategoryAttributes::Gpu {
                cores: None,
                memory_type: None,
                memory_size: None,
            },
            Category::Motherboard => CategoryAttributes::Motherboard { socket: None },
            Category::Drive => CategoryAttributes::Drive {
                size: None,
                read_speed: None,
                write_speed: None,
            },
            Category::Monitor => CategoryAttributes::Monitor {
                size: None,
                panel: None,
                refresh_rate: None,
            },
            Category::Keyboard => CategoryAttributes::Keyboard {
                keys_no: None,
                size: None,
                is_mechanical: None,
                is_rgb: None,
            },
            Category::Mouse => CategoryAttributes::Mouse {
                keys_no: None,
                is_rgb: None,
            },
        }
    }
}
