//! Default reference catalog
//!
//! The channel types and common attributes every deployment starts with.
//! Seeding is idempotent: codes that already exist, or were used and
//! retired, are skipped.

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::errors::{CatalogError, CatalogResult};
use crate::model::DataType;
use crate::observability::Event;
use crate::registry::{NewAttribute, NewChannelType};

/// (code, name, description, icon, color)
const DEFAULT_TYPES: &[(&str, &str, &str, Option<&str>, &str)] = &[
    ("platform_service", "플랫폼서비스", "온라인 플랫폼 및 서비스", Some("🌐"), "blue"),
    ("government", "정부기관", "정부 및 공공기관", Some("🏛️"), "gray"),
    ("competition", "공모전", "공모전 및 대회", Some("🏆"), "yellow"),
    ("portal_cafe", "포털카페", "네이버/다음 카페", Some("☕"), "amber"),
    ("sns_group", "SNS그룹", "페이스북, 인스타그램 등", Some("📱"), "purple"),
    ("community", "커뮤니티", "온라인 커뮤니티", Some("👥"), "green"),
    ("open_chat", "오픈단톡방", "카카오톡 오픈채팅", Some("💬"), "pink"),
    ("discord", "디스코드", "디스코드 서버", Some("🎮"), "indigo"),
    ("official_graduate", "공문-대학원", "대학원 공식 채널", None, "blue"),
    ("official_university", "공문-대학교", "대학교 공식 채널", None, "blue"),
    ("official_highschool", "공문-고등학교", "고등학교 공식 채널", None, "blue"),
    ("dm_academic", "DM-학회", "학회 DM 채널", None, "red"),
    ("dm_association", "DM-협회", "협회 DM 채널", None, "red"),
    ("dm_university", "DM-대학", "대학 DM 채널", None, "red"),
    ("outdoor_university", "옥외광고-대학", "대학 옥외광고", None, "teal"),
    ("outdoor_nst", "옥외광고-출연연NST", "출연연 옥외광고", None, "teal"),
    ("outdoor_partner", "옥외광고-협력기관", "협력기관 옥외광고", None, "teal"),
    ("performance", "퍼포먼스", "퍼포먼스 마케팅", None, "cyan"),
    ("event_site", "이벤트사이트", "이벤트 사이트", None, "amber"),
];

/// (code, name, data type)
const DEFAULT_ATTRIBUTES: &[(&str, &str, DataType)] = &[
    ("registration_date", "등록일", DataType::Date),
    ("update_date", "갱신일", DataType::Date),
    ("memo", "메모", DataType::Text),
    ("member_count", "인원", DataType::Number),
    ("url", "URL", DataType::Url),
    ("email", "이메일", DataType::Email),
    ("contact_person", "담당자", DataType::Text),
    ("contact_phone", "연락처", DataType::Text),
    ("main_phone", "대표전화", DataType::Text),
    ("address", "주소", DataType::Text),
];

/// What a seeding run changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub types_created: usize,
    pub attributes_created: usize,
    pub skipped: usize,
}

/// Installs the default channel types and attributes.
pub fn seed_defaults(catalog: &Catalog) -> CatalogResult<SeedReport> {
    let mut report = SeedReport::default();

    for (index, (code, name, description, icon, color)) in DEFAULT_TYPES.iter().enumerate() {
        let created = catalog.types.create(NewChannelType {
            code: code.to_string(),
            name: name.to_string(),
            description: Some(description.to_string()),
            icon: icon.map(str::to_string),
            color: Some(color.to_string()),
            display_order: Some(index as i32 + 1),
        });
        tally(created.map(|_| ()), code, &mut report.types_created, &mut report.skipped)?;
    }

    for (index, (code, name, data_type)) in DEFAULT_ATTRIBUTES.iter().enumerate() {
        let created = catalog.attributes.create(NewAttribute {
            code: code.to_string(),
            name: name.to_string(),
            data_type: *data_type,
            display_order: Some(index as i32 + 1),
        });
        tally(created.map(|_| ()), code, &mut report.attributes_created, &mut report.skipped)?;
    }

    info!(
        event = %Event::CatalogSeeded,
        types_created = report.types_created,
        attributes_created = report.attributes_created,
        skipped = report.skipped,
        "default catalog seeded"
    );
    Ok(report)
}

fn tally(
    result: CatalogResult<()>,
    code: &str,
    created: &mut usize,
    skipped: &mut usize,
) -> CatalogResult<()> {
    match result {
        Ok(()) => *created += 1,
        Err(CatalogError::UniquenessConflict { .. }) => {
            debug!(code, "already present, skipped");
            *skipped += 1;
        }
        Err(err) => return Err(err),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_idempotent() {
        let catalog = Catalog::in_memory();

        let first = seed_defaults(&catalog).unwrap();
        assert_eq!(first.types_created, DEFAULT_TYPES.len());
        assert_eq!(first.attributes_created, DEFAULT_ATTRIBUTES.len());
        assert_eq!(first.skipped, 0);

        let second = seed_defaults(&catalog).unwrap();
        assert_eq!(second.types_created, 0);
        assert_eq!(second.skipped, DEFAULT_TYPES.len() + DEFAULT_ATTRIBUTES.len());
    }

    #[test]
    fn test_seeded_types_keep_listing_order() {
        let catalog = Catalog::in_memory();
        seed_defaults(&catalog).unwrap();

        let types = catalog.types.list().unwrap();
        assert_eq!(types.len(), 19);
        assert_eq!(types[0].code, "platform_service");
        assert_eq!(types[7].code, "discord");
        assert_eq!(types[7].icon.as_deref(), Some("🎮"));

        let url = catalog.attributes.find_by_code("url").unwrap().unwrap();
        assert_eq!(url.data_type, DataType::Url);
    }

    #[test]
    fn test_default_codes_are_valid() {
        for (code, ..) in DEFAULT_TYPES {
            crate::model::validate_code(code).unwrap();
        }
        for (code, ..) in DEFAULT_ATTRIBUTES {
            crate::model::validate_attribute_code(code).unwrap();
        }
    }
}
