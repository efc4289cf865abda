//! Huntington Library manuscripts from the CONTENTdm digital collection.
//!
//! Discovery queries the CONTENTdm search API (one request, the API
//! caps at 1000 records); manifests come from the ContentDM IIIF v2
//! endpoint. The Ellesmere and Huntington Manuscripts sub-collections
//! share everything but the search term.

use anyhow::{bail, Result};
use url::Url;

use super::SourceSpec;
use crate::classify::{Classifier, ShelfmarkExtractor};
use crate::dates::DatePolicy;
use crate::discovery::{ApiEnumeration, DiscoveryStrategy, FieldRef, MetaArray};
use crate::models::RepositoryInfo;
use crate::record::SourcePolicy;

const CONTENTDM_BASE: &str = "https://hdl.huntington.org";
const COLLECTION_ID: &str = "p15150coll7";

pub(super) fn spec(collection_key: &str) -> Result<SourceSpec> {
    let (id, collection_name, search_term) = match collection_key {
        "EL" => ("huntington-el", "Ellesmere", "mssEL"),
        "HM" => ("huntington-hm", "Huntington Manuscripts", "mssHM"),
        other => bail!("unknown Huntington collection '{other}'"),
    };

    let search_url = format!(
        "{CONTENTDM_BASE}/digital/api/search/collection/{COLLECTION_ID}\
         /searchterm/{search_term}/field/callid/mode/exact/conn/and/maxRecords/1000"
    );

    let strategy = DiscoveryStrategy::Api(ApiEnumeration {
        url_template: search_url,
        first_page: 1,
        max_pages: 1,
        items_pointer: "/items".to_string(),
        base_url: Some(Url::parse(CONTENTDM_BASE)?),
        metadata_array: Some(MetaArray {
            pointer: "/metadataFields".to_string(),
            key_prop: "field".to_string(),
            value_prop: "value".to_string(),
        }),
        id_field: FieldRef::key("itemId"),
        shelfmark_field: Some(FieldRef::meta("callid")),
        title_field: Some(FieldRef::meta("title")),
        date_field: Some(FieldRef::meta("date")),
        thumbnail_field: Some(FieldRef::key("thumbnailUri")),
        manifest_url_field: None,
    });

    let policy = SourcePolicy {
        title_labels: vec!["Title".to_string()],
        date_labels: vec!["Date".to_string()],
        language_labels: vec!["Language".to_string()],
        extent_labels: vec!["Physical description".to_string()],
        provenance_labels: vec!["Provenance".to_string()],
        shelfmark_labels: vec!["Call Number".to_string()],
        shelfmark_rules: ShelfmarkExtractor::new(&[(r"mss(?:EL|HM)\s+[\w. ()]+", "")])?,
        fixed_collection: Some(collection_name.to_string()),
        classifier: Classifier::new(None, &[])?,
        date_policy: DatePolicy::default(),
        title_strip: Vec::new(),
    };

    Ok(SourceSpec {
        id,
        description: "Huntington Digital Library (CONTENTdm API)",
        repository: RepositoryInfo::new(
            "Huntington Library",
            "Huntington",
            None,
            &format!("{CONTENTDM_BASE}/digital/collection/{COLLECTION_ID}"),
        ),
        strategy,
        manifest_url_template: Some(format!(
            "{CONTENTDM_BASE}/iiif/2/{COLLECTION_ID}:{{id}}/manifest.json"
        )),
        source_url_template: Some(format!(
            "{CONTENTDM_BASE}/digital/collection/{COLLECTION_ID}/id/{{id}}"
        )),
        policy,
    })
}
