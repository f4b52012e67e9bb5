//! Static registry mapping diagnosis categories to the dataset columns they
//! contain, following the ICD chapter groupings used by the OECD health care
//! utilisation dataset.
//!
//! Each category owns an ordered list of per-diagnosis columns and, for most
//! categories, a precomputed aggregate column covering the whole chapter.
//! Two single-column categories (ear; congenital) have no separate aggregate
//! because their only column already is the chapter total.

pub struct Category {
    pub name: &'static str,
    /// Chapter-total column, where the dataset provides one.
    pub aggregate: Option<&'static str>,
    pub columns: &'static [&'static str],
}

pub const CATEGORIES: &[Category] = &[
    Category {
        name: "Infectious and parasitic diseases",
        aggregate: Some("Infectious and parasitic diseases_Per 100 000 population"),
        columns: &[
            "Intestinal infectious diseases except diarrhoea_Per 100 000 population",
            "Diarrhoea and gastroenteritis of presumed infectious origin_Per 100 000 population",
            "Tuberculosis_Per 100 000 population",
            "Septicaemia_Per 100 000 population",
            "Human immunodeficiency virus (HIV) disease_Per 100 000 population",
            "Other infectious and parasitic diseases_Per 100 000 population",
        ],
    },
    Category {
        name: "Neoplasms",
        aggregate: Some("Neoplasms_Per 100 000 population"),
        columns: &[
            "Malignant neoplasm of colon, rectum and anus_Per 100 000 population",
            "Malignant neoplasm of trachea, bronchus and lung_Per 100 000 population",
            "Malignant neoplasm of skin_Per 100 000 population",
            "Malignant neoplasm of breast_Per 100 000 females",
            "Malignant neoplasm of uterus_Per 100 000 females",
            "Malignant neoplasm of ovary_Per 100 000 females",
            "Malignant neoplasm of prostate_Per 100 000 males",
            "Malignant neoplasm of bladder_Per 100 000 population",
            "Other Malignant neoplasms_Per 100 000 population",
            "Carcinoma in situ_Per 100 000 population",
            "Benign neoplasm of colon, rectum and anus_Per 100 000 population",
            "Leiomyoma of uterus_Per 100 000 females",
            "Other Benign neoplasms and neoplasms of uncertain or unknown behaviour_Per 100 000 population",
        ],
    },
    Category {
        name: "Diseases of the blood and bloodforming organs",
        aggregate: Some("Diseases of the blood and bloodforming organs_Per 100 000 population"),
        columns: &[
            "Anaemias_Per 100 000 population",
            "Other diseases of the blood and bloodforming organs_Per 100 000 population",
        ],
    },
    Category {
        name: "Endocrine, nutritional and metabolic diseases",
        aggregate: Some("Endocrine, nutritional and metabolic diseases_Per 100 000 population"),
        columns: &[
            "Diabetes mellitus_Per 100 000 population",
            "Other endocrine, nutritional and metabolic diseases_Per 100 000 population",
        ],
    },
    Category {
        name: "Mental and behavioural disorders",
        aggregate: Some("Mental and behavioural disorders_Per 100 000 population"),
        columns: &[
            "Dementia_Per 100 000 population",
            "Mental and behavioural disorders due to alcohol_Per 100 000 population",
            "Mental and behavioural disorders due to use of Other psychoactive substance_Per 100 000 population",
            "Schizophrenia, schizotypal and delusional disorders_Per 100 000 population",
            "Mood (affective) disorders_Per 100 000 population",
            "Other Mental and behavioural disorders_Per 100 000 population",
        ],
    },
    Category {
        name: "Diseases of the nervous system",
        aggregate: Some("Diseases of the nervous system_Per 100 000 population"),
        columns: &[
            "Alzheimer's disease_Per 100 000 population",
            "Multiple sclerosis_Per 100 000 population",
            "Epilepsy_Per 100 000 population",
            "Transient cerebral ischaemic attacks and related syndromes_Per 100 000 population",
            "Other diseases of the nervous system_Per 100 000 population",
        ],
    },
    Category {
        name: "Diseases of the eye and adnexa",
        aggregate: Some("Diseases of the eye and adnexa_Per 100 000 population"),
        columns: &[
            "Cataract_Per 100 000 population",
            "Other diseases of the eye and adnexa_Per 100 000 population",
        ],
    },
    Category {
        name: "Diseases of the ear and mastoid process",
        // The single column is itself the chapter total.
        aggregate: None,
        columns: &["Diseases of the ear and mastoid process_Per 100 000 population"],
    },
    Category {
        name: "Diseases of the circulatory system",
        aggregate: Some("Diseases of the circulatory system_Per 100 000 population"),
        columns: &[
            "Hypertensive diseases_Per 100 000 population",
            "Angina pectoris_Per 100 000 population",
            "Acute myocardial infarction_Per 100 000 population",
            "Other ischaemic heart disease_Per 100 000 population",
            "Pulmonary heart disease and diseases of Pulmonary circulation_Per 100 000 population",
            "Conduction disorders and cardiac arrhythmias_Per 100 000 population",
            "Heart failure_Per 100 000 population",
            "Cerebrovascular diseases_Per 100 000 population",
            "Atherosclerosis_Per 100 000 population",
            "Varicose veins of lower extremities_Per 100 000 population",
            "Other diseases of the circulatory system_Per 100 000 population",
        ],
    },
    Category {
        name: "Diseases of the respiratory system",
        aggregate: Some("Diseases of the respiratory system_Per 100 000 population"),
        columns: &[
            "Acute upper respiratory infections and influenza_Per 100 000 population",
            "Pneumonia_Per 100 000 population",
            "Other acute lower respiratory infections_Per 100 000 population",
            "Chronic diseases of tonsils and adenoids_Per 100 000 population",
            "Other diseases of upper respiratory tract_Per 100 000 population",
            "Chronic obstructive Pulmonary disease and bronchiectasis_Per 100 000 population",
            "Asthma_Per 100 000 population",
            "Other diseases of the respiratory system_Per 100 000 population",
        ],
    },
    Category {
        name: "Diseases of the digestive system",
        aggregate: Some("Diseases of the digestive system_Per 100 000 population"),
        columns: &[
            "Disorders of teeth and supporting structures_Per 100 000 population",
            "Other diseases of oral cavity, salivary glands and jaws_Per 100 000 population",
            "Diseases of oesophagus_Per 100 000 population",
            "Peptic ulcer_Per 100 000 population",
            "Dyspepsia and Other diseases of stomach and duodenum_Per 100 000 population",
            "Diseases of appendix_Per 100 000 population",
            "Inguinal hernia_Per 100 000 population",
            "Other abdominal hernia_Per 100 000 population",
            "Crohn's disease and ulcerative colitis_Per 100 000 population",
            "Other noninfective gastroenteritis and colitis_Per 100 000 population",
            "Paralytic ileus and Intestinal obstruction without hernia_Per 100 000 population",
            "Diverticular disease of intestine_Per 100 000 population",
            "Diseases of anus and rectum_Per 100 000 population",
            "Other diseases of intestine_Per 100 000 population",
            "Alcoholic liver disease_Per 100 000 population",
            "Other diseases of liver_Per 100 000 population",
            "Cholelithiasis_Per 100 000 population",
            "Other diseases of gall bladder and biliary tract_Per 100 000 population",
            "Diseases of pancreas_Per 100 000 population",
            "Other diseases of the digestive system_Per 100 000 population",
        ],
    },
    Category {
        name: "Diseases of the skin and subcutaneous tissue",
        aggregate: Some("Diseases of the skin and subcutaneous tissue_Per 100 000 population"),
        columns: &[
            "Infections of the skin and subcutaneous tissue_Per 100 000 population",
            "Dermatitis, eczema and papulosquamous disorders_Per 100 000 population",
            "Other diseases of the skin and subcutaneous tissue_Per 100 000 population",
        ],
    },
    Category {
        name: "Diseases of musculoskeletal system and connective tissue",
        aggregate: Some("Diseases of musculoskeletal system and connective tissue_Per 100 000 population"),
        columns: &[
            "Coxarthrosis (arthrosis of hip)_Per 100 000 population",
            "Gonarthrosis (arthrosis of knee)_Per 100 000 population",
            "Internal derangement of knee_Per 100 000 population",
            "Other arthropathies_Per 100 000 population",
            "Systemic connective tissue disorders_Per 100 000 population",
            "Deforming dorsopathies and spondylopathies_Per 100 000 population",
            "Intervertebral disc disorders_Per 100 000 population",
            "Dorsalgia_Per 100 000 population",
            "Soft tissue disorders_Per 100 000 population",
            "Other disorders of the musculoskeletal system and connective tissue_Per 100 000 population",
        ],
    },
    Category {
        name: "Diseases of the genitourinary system",
        aggregate: Some("Diseases of the genitourinary system_Per 100 000 population"),
        columns: &[
            "Glomerular and renal tubulo-interstitial diseases_Per 100 000 population",
            "Renal failure_Per 100 000 population",
            "Urolithiasis_Per 100 000 population",
            "Other diseases of the urinary system_Per 100 000 population",
            "Hyperplasia of prostate_Per 100 000 males",
            "Other diseases of Male genital organs_Per 100 000 males",
            "Disorders of breast_Per 100 000 females",
            "Inflammatory diseases of Female pelvic organs_Per 100 000 females",
            "Menstrual, menopausal and Other Female genital conditions_Per 100 000 females",
            "Other disorders of the genitourinary system_Per 100 000 females",
        ],
    },
    Category {
        name: "Pregnancy, childbirth and the puerperium",
        aggregate: Some("Pregnancy, childbirth and the puerperium_Per 100 000 females"),
        columns: &[
            "Medical abortion_Per 100 000 females",
            "Other pregnancy with abortive outcome_Per 100 000 females",
            "Complications of pregnancy in the antenatal period_Per 100 000 females",
            "Complications of pregnancy predominantly during labour and delivery_Per 100 000 females",
            "Single spontaneous delivery_Per 100 000 females",
            "Other delivery_Per 100 000 females",
            "Complications predominantly related to the puerperium_Per 100 000 females",
            "Other obstetric conditions_Per 100 000 females",
        ],
    },
    Category {
        name: "Certain conditions originating in the perinatal period",
        aggregate: Some("Certain conditions originating in the perinatal period_Per 100 000 population"),
        columns: &[
            "Disorders related to short gestation and low birthweight_Per 100 000 population",
            "Other conditions originating in the perinatal period_Per 100 000 population",
        ],
    },
    Category {
        name: "Congenital malformations, deformations and chromosomal abnormalities",
        // The single column is itself the chapter total.
        aggregate: None,
        columns: &[
            "Congenital malformations, deformations and chromosomal abnormalities_Per 100 000 population",
        ],
    },
    Category {
        name: "Symptoms, signs and abnormal clinical and laboratory findings, n.e.c.",
        aggregate: Some("Symptoms, signs and abnormal clinical and laboratory findings, n.e.c._Per 100 000 population"),
        columns: &[
            "Pain in throat and chest_Per 100 000 population",
            "Abdominal and pelvic Pain_Per 100 000 population",
            "Unknown and unspecified causes of morbidity_Per 100 000 population",
            "Other symptoms, signs and abnormal clinical and laboratory findings_Per 100 000 population",
        ],
    },
    Category {
        name: "Injury, poisoning and other consequences of external causes",
        aggregate: Some("Injury, poisoning and other consequences of external causes_Per 100 000 population"),
        columns: &[
            "Intracranial injury_Per 100 000 population",
            "Other injuries to the head_Per 100 000 population",
            "Fracture of forearm_Per 100 000 population",
            "Fracture of femur_Per 100 000 population",
            "Fracture of lower leg, including ankle_Per 100 000 population",
            "Other injuries_Per 100 000 population",
            "Burns and corrosions_Per 100 000 population",
            "Poisonings by drugs, medicaments, and biological substances and toxic effects_Per 100 000 population",
            "Complications of Surgical and medical care, n.e.c._Per 100 000 population",
            "Sequelae of injuries, of poisoning and of Other external causes_Per 100 000 population",
            "Other and unspecified effects of external causes_Per 100 000 population",
        ],
    },
    Category {
        name: "Factors influencing health status and contact with health services",
        aggregate: Some("Factors influencing health status and contact with health services_Per 100 000 population"),
        columns: &[
            "Medical observation and evaluation for suspected diseases and conditions_Per 100 000 population",
            "Contraceptive management_Per 100 000 population",
            "Liveborn infants according to place of birth_Per 100 000 population",
            "Other medical care (including radiotherapy and chemotherapy sessions)_Per 100 000 population",
            "Other factors influencing Health status and contact with Health services_Per 100 000 population",
        ],
    },
];

pub fn find(name: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.name == name)
}

/// Category names picked out of an enabled-flags vector aligned with
/// [`CATEGORIES`]. Registry order, so the result is deterministic for a
/// given set of flags.
pub fn selected_names(enabled: &[bool]) -> Vec<&'static str> {
    CATEGORIES
        .iter()
        .zip(enabled.iter().copied())
        .filter_map(|(c, on)| on.then_some(c.name))
        .collect()
}

/// Resolves category names to dataset columns, preserving category order.
/// With `include_aggregates`, each category's chapter-total column (when it
/// has one) precedes its per-diagnosis columns.
pub fn columns_for<'a, I>(selected: I, include_aggregates: bool) -> Vec<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::new();
    for name in selected {
        let Some(cat) = find(name) else {
            debug_assert!(false, "unknown category {name:?}");
            continue;
        };
        if include_aggregates {
            if let Some(agg) = cat.aggregate {
                out.push(agg);
            }
        }
        out.extend_from_slice(cat.columns);
    }
    out
}

/// Every registry column in registry order, aggregates first per category.
pub fn all_columns_with_aggregates() -> Vec<&'static str> {
    columns_for(CATEGORIES.iter().map(|c| c.name), true)
}

/// Columns that represent a whole chapter rather than a single diagnosis:
/// the aggregate columns plus the sole column of each aggregate-less
/// single-column category.
pub fn summary_columns() -> Vec<&'static str> {
    let mut out: Vec<&'static str> = CATEGORIES.iter().filter_map(|c| c.aggregate).collect();
    for cat in CATEGORIES {
        if cat.aggregate.is_none() && cat.columns.len() == 1 {
            out.push(cat.columns[0]);
        }
    }
    out
}

/// The category a column belongs to, whether as a member or as the
/// aggregate.
pub fn category_of_column(column: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| {
        c.aggregate == Some(column) || c.columns.contains(&column)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn columns_do_not_overlap_across_categories() {
        let mut seen = HashSet::new();
        for cat in CATEGORIES {
            for col in cat.columns {
                assert!(seen.insert(*col), "column {col:?} appears twice");
            }
        }
    }

    #[test]
    fn neoplasms_has_thirteen_columns() {
        let cat = find("Neoplasms").unwrap();
        assert_eq!(cat.columns.len(), 13);
        assert!(cat.aggregate.is_some());
    }

    #[test]
    fn columns_for_prepends_aggregates_per_category() {
        let cols = columns_for(["Neoplasms"], true);
        assert_eq!(cols.len(), 14);
        assert_eq!(cols[0], "Neoplasms_Per 100 000 population");

        let cols = columns_for(["Neoplasms"], false);
        assert_eq!(cols.len(), 13);
        assert!(!cols.contains(&"Neoplasms_Per 100 000 population"));
    }

    #[test]
    fn columns_for_preserves_selection_order() {
        let cols = columns_for(
            ["Diseases of the eye and adnexa", "Neoplasms"],
            false,
        );
        assert_eq!(cols[0], "Cataract_Per 100 000 population");
        assert_eq!(cols.len(), 2 + 13);
    }

    #[test]
    fn summary_columns_include_single_column_chapters() {
        let summary = summary_columns();
        assert!(summary
            .contains(&"Diseases of the ear and mastoid process_Per 100 000 population"));
        assert!(summary.contains(
            &"Congenital malformations, deformations and chromosomal abnormalities_Per 100 000 population"
        ));
        // 18 aggregates + 2 single-column chapter totals
        assert_eq!(summary.len(), 20);
    }

    #[test]
    fn selected_names_follows_registry_order() {
        let mut enabled = vec![false; CATEGORIES.len()];
        enabled[1] = true;
        enabled[0] = true;
        let names = selected_names(&enabled);
        assert_eq!(
            names,
            vec!["Infectious and parasitic diseases", "Neoplasms"]
        );
    }

    #[test]
    fn category_of_column_resolves_members_and_aggregates() {
        let cat = category_of_column("Cataract_Per 100 000 population").unwrap();
        assert_eq!(cat.name, "Diseases of the eye and adnexa");
        let cat = category_of_column("Neoplasms_Per 100 000 population").unwrap();
        assert_eq!(cat.name, "Neoplasms");
        assert!(category_of_column("no such column").is_none());
    }
}
