//! Reference catalog of case types.
//!
//! `jenis_litmas` is stored as a free string so older rows with ad-hoc
//! labels still load; registration checks known codes against the client's
//! age category.

use serde::Serialize;

use crate::model::KategoriUsia;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JenisLitmas {
    pub code: &'static str,
    pub label: &'static str,
    /// `None` when the type applies to both age categories.
    pub kategori_usia: Option<KategoriUsia>,
}

pub const JENIS_LITMAS: &[JenisLitmas] = &[
    JenisLitmas {
        code: "PB",
        label: "Pembebasan Bersyarat",
        kategori_usia: None,
    },
    JenisLitmas {
        code: "CB",
        label: "Cuti Bersyarat",
        kategori_usia: None,
    },
    JenisLitmas {
        code: "CMB",
        label: "Cuti Menjelang Bebas",
        kategori_usia: Some(KategoriUsia::Dewasa),
    },
    JenisLitmas {
        code: "ASM",
        label: "Asimilasi",
        kategori_usia: None,
    },
    JenisLitmas {
        code: "DIV",
        label: "Diversi",
        kategori_usia: Some(KategoriUsia::Anak),
    },
    JenisLitmas {
        code: "SDA",
        label: "Sidang Anak",
        kategori_usia: Some(KategoriUsia::Anak),
    },
    JenisLitmas {
        code: "PLL",
        label: "Pembinaan Luar Lembaga",
        kategori_usia: Some(KategoriUsia::Anak),
    },
];

/// Find a catalog entry by code or label, ignoring case.
pub fn lookup_jenis_litmas(key: &str) -> Option<&'static JenisLitmas> {
    let key = key.trim();
    JENIS_LITMAS
        .iter()
        .find(|j| j.code.eq_ignore_ascii_case(key) || j.label.eq_ignore_ascii_case(key))
}

impl JenisLitmas {
    pub fn applies_to(&self, kategori: KategoriUsia) -> bool {
        self.kategori_usia.map_or(true, |k| k == kategori)
    }
}
