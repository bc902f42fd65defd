use serde::{Deserialize, Serialize};

/// Label reserved for the per-species total row of a remanente report.
pub const TOTAL_LABEL: &str = "TOTAL";

/// Species (e.g. "Bovino").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Especie {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub categorias: Vec<CategoriaEspecie>,
}

/// Category within a species (e.g. "Vaquillona" within "Bovino").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoriaEspecie {
    pub id: i64,
    pub especie_id: i64,
    pub nombre: String,
}

/// Slaughter licence holder that owns a herd.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TitularFaena {
    pub id: i64,
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuit: Option<String>,
}

/// Disease that motivates a seizure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enfermedad {
    pub id: i64,
    pub nombre: String,
}

/// Type of seized organ or part.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TipoParte {
    pub id: i64,
    pub nombre: String,
}

// ── Seed ────────────────────────────────────────────────────────────

/// Reference data inserted at start-up. Names already present are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogSeed {
    pub especies: Vec<EspecieSeed>,
    pub enfermedades: Vec<String>,
    pub tipos_parte: Vec<String>,
    pub titulares: Vec<TitularSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EspecieSeed {
    pub nombre: String,
    #[serde(default)]
    pub categorias: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitularSeed {
    pub nombre: String,
    #[serde(default)]
    pub cuit: Option<String>,
}

impl CatalogSeed {
    /// Check names before anything is written.
    pub fn validate(&self) -> Result<(), String> {
        for especie in &self.especies {
            if especie.nombre.trim().is_empty() {
                return Err("species name must not be empty".into());
            }
            for categoria in &especie.categorias {
                if categoria.trim().is_empty() {
                    return Err(format!("empty category name in species '{}'", especie.nombre));
                }
                if categoria == TOTAL_LABEL {
                    return Err(format!(
                        "category name '{TOTAL_LABEL}' is reserved (species '{}')",
                        especie.nombre
                    ));
                }
            }
        }
        let named = self
            .enfermedades
            .iter()
            .chain(self.tipos_parte.iter())
            .chain(self.titulares.iter().map(|t| &t.nombre));
        for nombre in named {
            if nombre.trim().is_empty() {
                return Err("catalog names must not be empty".into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> CatalogSeed {
        CatalogSeed {
            especies: vec![EspecieSeed {
                nombre: "Bovino".into(),
                categorias: vec!["Vaquillona".into(), "Novillo".into()],
            }],
            enfermedades: vec!["Hidatidosis".into()],
            tipos_parte: vec!["Hígado".into()],
            titulares: vec![TitularSeed {
                nombre: "Frigorífico Norte".into(),
                cuit: None,
            }],
        }
    }

    #[test]
    fn valid_seed() {
        assert!(seed().validate().is_ok());
    }

    #[test]
    fn total_category_rejected() {
        let mut s = seed();
        s.especies[0].categorias.push("TOTAL".into());
        let err = s.validate().unwrap_err();
        assert!(err.contains("reserved"));
    }

    #[test]
    fn blank_names_rejected() {
        let mut s = seed();
        s.tipos_parte.push("  ".into());
        assert!(s.validate().is_err());

        let mut s = seed();
        s.especies[0].nombre = String::new();
        assert!(s.validate().is_err());
    }

    #[test]
    fn total_is_case_sensitive() {
        let mut s = seed();
        s.especies[0].categorias.push("Total".into());
        assert!(s.validate().is_ok());
    }
}
