// src/reports/layout.rs
//! Per-subtype descriptors. Every report is built by the same projection from one of these.

use super::ReportSubtype;

/// Where a result cell gets its text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Source {
    /// Text field, shown uppercased.
    Field(&'static str),
    /// First element of a single-result field, shown as `Reactive` / `Nonreactive`.
    SingleResult(&'static str),
    /// First present field wins and supplies its own label; `fallback` fills the row otherwise.
    FirstPresent {
        options: &'static [(&'static str, &'static str)],
        fallback: &'static str,
    },
    Fixed(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    Plain,
    /// Warning color when the value is numeric and above the limit.
    Above(f64),
    /// Warning color and a widened column when the value matches, ignoring case.
    Flag(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub label: &'static str,
    pub source: Source,
    pub unit: &'static str,
    pub range: &'static str,
    pub rule: Rule,
}

impl Line {
    const fn new(label: &'static str, field: &'static str) -> Self {
        Self { label, source: Source::Field(field), unit: "", range: "", rule: Rule::Plain }
    }

    const fn unit(self, unit: &'static str) -> Self {
        Self { unit, ..self }
    }

    const fn range(self, range: &'static str) -> Self {
        Self { range, ..self }
    }

    const fn rule(self, rule: Rule) -> Self {
        Self { rule, ..self }
    }

    const fn source(self, source: Source) -> Self {
        Self { source, ..self }
    }
}

/// A repeatable `{type, details}` field rendered as a labelled sub-group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryGroup {
    pub label: &'static str,
    pub field: &'static str,
    pub unit: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Block {
    Lines {
        heading: Option<&'static str>,
        columns: &'static [&'static str],
        /// Cells per row: label, value, unit, range, truncated to this many.
        width: usize,
        lines: &'static [Line],
    },
    Entries {
        heading: Option<&'static str>,
        groups: &'static [EntryGroup],
    },
    /// Unstructured result list, one row per value.
    Values {
        label: &'static str,
        field: &'static str,
    },
    /// Kit use, lot and expiry of the kit behind a serology panel.
    Kit {
        /// Prefix of the superseded per-panel kit fields.
        panel: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub title: &'static str,
    pub section: &'static str,
    pub test: Option<&'static str>,
    pub blocks: &'static [Block],
    pub remarks: &'static str,
}

const MICROSCOPY: &str = "CLINICAL MICROSCOPY RESULT";
const HEMATOLOGY: &str = "HEMATOLOGY RESULT";
const SEROLOGY: &str = "SEROLOGY RESULT";
const CHEMISTRY: &str = "CHEMISTRY RESULT";

const TEST_RESULT: &[&str] = &["Test", "Result:"];
const TEST_RESULT_RANGE: &[&str] = &["TEST", "Result", "", "Ref. Range"];

// ==================== CLINICAL MICROSCOPY ====================

const URINALYSIS: Layout = Layout {
    title: "Urinalysis Result",
    section: MICROSCOPY,
    test: Some("Urinalysis"),
    blocks: &[
        Block::Lines {
            heading: Some("Physical Analysis"),
            columns: &[],
            width: 2,
            lines: &[
                Line::new("Color:", "urinalysis_color"),
                Line::new("Transparency:", "urinalysis_transparency"),
            ],
        },
        Block::Lines {
            heading: Some("Chemical Analysis"),
            columns: &[],
            width: 2,
            lines: &[
                Line::new("Glucose:", "urinalysis_glucose"),
                Line::new("Protein:", "urinalysis_protein"),
                Line::new("pH:", "urinalysis_ph"),
                Line::new("Sp. Gravity:", "urinalysis_spgravity"),
            ],
        },
        Block::Lines {
            heading: Some("Microscopic Analysis"),
            columns: &[],
            width: 3,
            lines: &[
                Line::new("WBC:", "urinalysis_wbc").unit("/HPF"),
                Line::new("RBC:", "urinalysis_rbc").unit("/HPF"),
                Line::new("Bacteria:", "urinalysis_bacteria").unit("/LPF"),
                Line::new("Epithelial Cells:", "urinalysis_epithelial_cells").unit("/LPF"),
                Line::new("Amorphous:", "urinalysis_amorphous")
                    .source(Source::FirstPresent {
                        options: &[
                            ("Amorphous Urates:", "urinalysis_amorphous"),
                            ("Amorphous Phosphates:", "urinalysis_phosphates"),
                        ],
                        fallback: "N/A",
                    })
                    .unit("/LPF"),
                Line::new("Mucus Thread:", "urinalysis_mucus_threads").unit("/LPF"),
            ],
        },
        Block::Entries {
            heading: Some("Others:"),
            groups: &[
                EntryGroup { label: "Cast:", field: "urinalysis_casts", unit: "/LPF" },
                EntryGroup { label: "Crystals:", field: "urinalysis_crystals", unit: "/LPF" },
                EntryGroup { label: "Fungal Elements:", field: "urinalysis_fungal_elements", unit: "/HPF" },
                EntryGroup { label: "Parasite:", field: "urinalysis_parasite", unit: "/HPF" },
            ],
        },
    ],
    remarks: "urinalysis_remarks",
};

const FECALYSIS: Layout = Layout {
    title: "Fecalysis Result",
    section: MICROSCOPY,
    test: Some("Fecalysis"),
    blocks: &[
        Block::Lines {
            heading: Some("Physical Analysis"),
            columns: &[],
            width: 2,
            lines: &[
                Line::new("Color:", "fecalysis_color"),
                Line::new("Consistency:", "fecalysis_consistency"),
            ],
        },
        Block::Lines {
            heading: Some("Microscopic Analysis"),
            columns: &[],
            width: 3,
            lines: &[
                Line::new("WBC:", "fecalysis_wbc").unit("/HPF"),
                Line::new("RBC:", "fecalysis_rbc").unit("/HPF"),
                Line::new("Result:", "fecalysis_results"),
            ],
        },
    ],
    remarks: "fecalysis_remarks",
};

// ==================== HEMATOLOGY ====================

const CBC: Layout = Layout {
    title: "CBC Result",
    section: HEMATOLOGY,
    test: Some("Complete Blood Count"),
    blocks: &[
        Block::Lines {
            heading: Some("White Blood Cells"),
            columns: &["TEST", "RESULT", "UNIT", "REF. RANGE"],
            width: 4,
            lines: &[
                Line::new("WBC:", "cbc_wbc").unit("x 10^9/L").range("3.5 - 9.5"),
                Line::new("NEU%:", "cbc_neu").unit("%").range("40 - 75"),
                Line::new("LYM%:", "cbc_lym").unit("%").range("20 - 50"),
                Line::new("MON%:", "cbc_mon").unit("%").range("3 - 12"),
                Line::new("EOS%:", "cbc_eos").unit("%").range("0.5 - 5"),
                Line::new("BAS%:", "cbc_bas").unit("%").range("0 - 1"),
            ],
        },
        Block::Lines {
            heading: Some("Red Blood Cells"),
            columns: &["TEST", "RESULT", "UNIT", "REF. RANGE"],
            width: 4,
            lines: &[
                Line::new("RBC:", "cbc_rbc").unit("x 10^12/L").range("3.8 - 5.1"),
                Line::new("HGB:", "cbc_hgb").unit("g/L").range("115 - 150"),
                Line::new("HCT:", "cbc_hct").unit("%").range("35 - 45"),
                Line::new("MCV:", "cbc_mcv").unit("fl").range("82 - 100"),
                Line::new("MCH:", "cbc_mch").unit("pg").range("27 - 34"),
                Line::new("MCHC:", "cbc_mchc").unit("g/l").range("316 - 354"),
            ],
        },
        Block::Lines {
            heading: Some("Platelets"),
            columns: &["TEST", "RESULT", "UNIT", "REF. RANGE"],
            width: 4,
            lines: &[Line::new("PLT:", "cbc_plt").unit("x 10^9/L").range("125 - 350")],
        },
    ],
    remarks: "cbc_remarks",
};

const BLOOD_TYPE: Layout = Layout {
    title: "Blood Typing Result",
    section: HEMATOLOGY,
    test: Some("Blood Typing (Forward)"),
    blocks: &[
        Block::Lines {
            heading: None,
            columns: &["Test", "Result"],
            width: 2,
            lines: &[
                Line::new("ABO Group:", "bt_abo_group"),
                Line::new("Rh(D):", "bt_rh"),
            ],
        },
        Block::Lines {
            heading: None,
            columns: &[],
            width: 2,
            lines: &[Line::new("Method:", "").source(Source::Fixed("Tube Technique"))],
        },
    ],
    remarks: "cbc_remarks",
};

// ==================== SEROLOGY ====================

const SYPHILIS: Layout = Layout {
    title: "Syphilis Result",
    section: SEROLOGY,
    test: Some("Syphilis Screening"),
    blocks: &[
        Block::Values { label: "Treponema pallidum Antibody", field: "ss_result" },
        Block::Kit { panel: "ss" },
    ],
    remarks: "ss_remarks",
};

const HBSAG: Layout = Layout {
    title: "HBsAg Result",
    section: SEROLOGY,
    test: None,
    blocks: &[
        Block::Lines {
            heading: None,
            columns: TEST_RESULT,
            width: 2,
            lines: &[Line::new("Hepatitis B Virus surface antigen Screening", "hbsag_result")
                .source(Source::SingleResult("hbsag_result"))
                .rule(Rule::Flag("REACTIVE"))],
        },
        Block::Kit { panel: "hbsag" },
    ],
    remarks: "hbsag_remarks",
};

const DENGUE: Layout = Layout {
    title: "Dengue Result",
    section: SEROLOGY,
    test: Some("Dengue Duo (NS1 Ag + IgG/IgM)"),
    blocks: &[
        Block::Entries {
            heading: None,
            groups: &[EntryGroup { label: "Result:", field: "dd_result", unit: "" }],
        },
        Block::Kit { panel: "dd" },
    ],
    remarks: "dd_remarks",
};

const HIV: Layout = Layout {
    title: "HIV Result",
    section: SEROLOGY,
    test: Some("HIV 1/2 Antibody Screening"),
    blocks: &[
        Block::Entries {
            heading: None,
            groups: &[EntryGroup { label: "Result:", field: "hiv_result", unit: "" }],
        },
        Block::Kit { panel: "hiv" },
    ],
    remarks: "hiv_remarks",
};

// ==================== CHEMISTRY ====================

const RBS: Layout = Layout {
    title: "RBS Result",
    section: CHEMISTRY,
    test: None,
    blocks: &[Block::Lines {
        heading: None,
        columns: TEST_RESULT_RANGE,
        width: 4,
        lines: &[Line::new("Random Blood Sugar", "rbs").range("70 - 140 mg/dl").rule(Rule::Above(140.0))],
    }],
    remarks: "remarks",
};

const FBS: Layout = Layout {
    title: "FBS Result",
    section: CHEMISTRY,
    test: None,
    blocks: &[Block::Lines {
        heading: None,
        columns: TEST_RESULT_RANGE,
        width: 4,
        lines: &[Line::new("Fasting Blood Sugar", "fasting").range("70 - 110 mg/dl")],
    }],
    remarks: "remarks",
};

pub fn for_subtype(subtype: ReportSubtype) -> &'static Layout {
    match subtype {
        ReportSubtype::Urinalysis => &URINALYSIS,
        ReportSubtype::Fecalysis => &FECALYSIS,
        ReportSubtype::Cbc => &CBC,
        ReportSubtype::BloodType => &BLOOD_TYPE,
        ReportSubtype::Syphilis => &SYPHILIS,
        ReportSubtype::Hbsag => &HBSAG,
        ReportSubtype::Dengue => &DENGUE,
        ReportSubtype::Hiv => &HIV,
        ReportSubtype::Rbs => &RBS,
        ReportSubtype::Fbs => &FBS,
    }
}
