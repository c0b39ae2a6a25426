//! Pinterest Ads stream definitions

use super::spec::{Column, ParamsBuilder, PostProcess, SkipRule, StreamSpec};
use crate::http::{ResponseClass, StatusOverrides};
use crate::pagination::CursorStrategy;
use crate::partition::{ContextField, ContextProjection};

/// Metric columns requested from the ad analytics endpoint
pub const AD_ANALYTICS_COLUMNS: &[&str] = &[
    "SPEND_IN_DOLLAR",
    "ECPC_IN_DOLLAR",
    "CTR",
    "ECTR",
    "ECPE_IN_DOLLAR",
    "ENGAGEMENT_RATE",
    "EENGAGEMENT_RATE",
    "REPIN_RATE",
    "CTR_2",
    "CAMPAIGN_ID",
    "AD_ACCOUNT_ID",
    "AD_ID",
    "AD_GROUP_ID",
    "CAMPAIGN_ENTITY_STATUS",
    "CPM_IN_DOLLAR",
    "AD_GROUP_ENTITY_STATUS",
    "TOTAL_CLICKTHROUGH",
    "TOTAL_IMPRESSION_FREQUENCY",
    "TOTAL_ENGAGEMENT_SIGNUP",
    "TOTAL_ENGAGEMENT_CHECKOUT",
    "TOTAL_CLICK_SIGNUP",
    "TOTAL_CLICK_CHECKOUT",
    "TOTAL_VIEW_SIGNUP",
    "TOTAL_VIEW_CHECKOUT",
    "TOTAL_CONVERSIONS",
    "TOTAL_ENGAGEMENT_SIGNUP_VALUE_IN_MICRO_DOLLAR",
    "TOTAL_ENGAGEMENT_CHECKOUT_VALUE_IN_MICRO_DOLLAR",
    "TOTAL_CLICK_SIGNUP_VALUE_IN_MICRO_DOLLAR",
    "TOTAL_CLICK_CHECKOUT_VALUE_IN_MICRO_DOLLAR",
    "TOTAL_VIEW_SIGNUP_VALUE_IN_MICRO_DOLLAR",
    "TOTAL_VIEW_CHECKOUT_VALUE_IN_MICRO_DOLLAR",
    "TOTAL_PAGE_VISIT",
    "TOTAL_SIGNUP",
    "TOTAL_CHECKOUT",
    "TOTAL_SIGNUP_VALUE_IN_MICRO_DOLLAR",
    "TOTAL_CHECKOUT_VALUE_IN_MICRO_DOLLAR",
    "PAGE_VISIT_COST_PER_ACTION",
    "PAGE_VISIT_ROAS",
    "CHECKOUT_ROAS",
    "VIDEO_3SEC_VIEWS_2",
    "VIDEO_P100_COMPLETE_2",
    "VIDEO_P0_COMBINED_2",
    "VIDEO_P25_COMBINED_2",
    "VIDEO_P50_COMBINED_2",
    "VIDEO_P75_COMBINED_2",
    "VIDEO_P95_COMBINED_2",
    "VIDEO_MRC_VIEWS_2",
    "ECPV_IN_DOLLAR",
    "ECPCV_IN_DOLLAR",
    "ECPCV_P95_IN_DOLLAR",
    "TOTAL_VIDEO_3SEC_VIEWS",
    "TOTAL_VIDEO_P100_COMPLETE",
    "TOTAL_VIDEO_P0_COMBINED",
    "TOTAL_VIDEO_P25_COMBINED",
    "TOTAL_VIDEO_P50_COMBINED",
    "TOTAL_VIDEO_P75_COMBINED",
    "TOTAL_VIDEO_P95_COMBINED",
    "TOTAL_VIDEO_MRC_VIEWS",
    "TOTAL_VIDEO_AVG_WATCHTIME_IN_SECOND",
    "TOTAL_REPIN_RATE",
    "WEB_CHECKOUT_COST_PER_ACTION",
    "WEB_CHECKOUT_ROAS",
    "TOTAL_WEB_CHECKOUT",
    "TOTAL_WEB_CHECKOUT_VALUE_IN_MICRO_DOLLAR",
    "TOTAL_WEB_CLICK_CHECKOUT",
    "TOTAL_WEB_CLICK_CHECKOUT_VALUE_IN_MICRO_DOLLAR",
    "TOTAL_WEB_ENGAGEMENT_CHECKOUT",
    "TOTAL_WEB_ENGAGEMENT_CHECKOUT_VALUE_IN_MICRO_DOLLAR",
    "TOTAL_WEB_VIEW_CHECKOUT",
    "TOTAL_WEB_VIEW_CHECKOUT_VALUE_IN_MICRO_DOLLAR",
];

/// Identifier columns that only exist below the account level
const ENTITY_ONLY_COLUMNS: &[&str] = &[
    "CAMPAIGN_ID",
    "AD_ID",
    "AD_GROUP_ID",
    "CAMPAIGN_ENTITY_STATUS",
    "AD_GROUP_ENTITY_STATUS",
];

/// Metric columns requested from the account analytics endpoint
pub fn account_analytics_columns() -> Vec<&'static str> {
    AD_ANALYTICS_COLUMNS
        .iter()
        .copied()
        .filter(|c| !ENTITY_ONLY_COLUMNS.contains(c))
        .collect()
}

fn tracking_urls() -> Column {
    Column::object(
        "tracking_urls",
        vec![
            Column::string_array("impression"),
            Column::string_array("click"),
            Column::string_array("engagement"),
            Column::string_array("buyable_button"),
            Column::string_array("audience_verification"),
        ],
    )
}

/// Analytics endpoints: 429 first, then the 4xx/5xx split, bodies omitted
fn analytics_overrides() -> StatusOverrides {
    StatusOverrides::none()
        .status(429, ResponseClass::Retriable)
        .range(400..=499, ResponseClass::Fatal)
        .range(500..=599, ResponseClass::Retriable)
        .without_body()
}

fn metric_columns(key_columns: Vec<Column>, metrics: &[&str]) -> Vec<Column> {
    let mut columns = key_columns;
    for metric in metrics {
        if !columns.iter().any(|c| c.name == *metric) {
            columns.push(Column::number(*metric));
        }
    }
    columns
}

pub fn ad_accounts() -> StreamSpec {
    StreamSpec::new("ad_accounts", "ad_accounts")
        .columns(vec![
            Column::string("id"),
            Column::string("name"),
            Column::object("owner", vec![Column::string("username")]),
            Column::string("country"),
            Column::string("currency"),
        ])
        .child_context(ContextProjection::new(vec![ContextField::required(
            "ad_account_id",
            "id",
        )]))
}

pub fn campaigns() -> StreamSpec {
    StreamSpec::new("campaigns", "ad_accounts/{ad_account_id}/campaigns")
        .parent("ad_accounts")
        .columns(vec![
            Column::string("id"),
            Column::string("ad_account_id"),
            Column::string("name"),
            Column::string("status"),
            Column::number("lifetime_spend_cap"),
            Column::number("daily_spend_cap"),
            Column::string("order_line_id"),
            tracking_urls(),
            Column::string("objective_type"),
            Column::number("created_time"),
            Column::number("updated_time"),
            Column::string("type"),
        ])
}

pub fn ad_groups() -> StreamSpec {
    StreamSpec::new("ad_groups", "ad_accounts/{ad_account_id}/ad_groups")
        .parent("ad_accounts")
        .columns(vec![
            Column::string("name"),
            Column::string("status"),
            Column::number("budget_in_micro_currency"),
            Column::number("bid_in_micro_currency"),
            Column::string("budget_type"),
            Column::number("start_time"),
            Column::number("end_time"),
            Column::object(
                "targeting_spec",
                vec![
                    Column::string_array("AGE_BUCKET"),
                    Column::string_array("LOCATION"),
                    Column::string_array("SHOPPING_RETARGETING"),
                    Column::string_array("AUDIENCE_INCLUDE"),
                    Column::string_array("TARGETING_STRATEGY"),
                    Column::string_array("GENDER"),
                    Column::string_array("INTEREST"),
                    Column::string_array("LOCALE"),
                    Column::string_array("APPTYPE"),
                    Column::string_array("AUDIENCE_EXCLUDE"),
                ],
            ),
            Column::number("lifetime_frequency_cap"),
            tracking_urls(),
            Column::boolean("auto_targeting_enabled"),
            Column::string("placement_group"),
            Column::string("pacing_delivery_type"),
            Column::string("conversion_learning_mode_type"),
            Column::string("summary_status"),
            Column::string("feed_profile_id"),
            Column::string("campaign_id"),
            Column::string("billable_event"),
            Column::string("id"),
            Column::string("type"),
            Column::string("ad_account_id"),
            Column::number("created_time"),
            Column::number("updated_time"),
        ])
}

pub fn ads() -> StreamSpec {
    StreamSpec::new("ads", "ad_accounts/{ad_account_id}/ads")
        .parent("ad_accounts")
        .columns(vec![
            Column::string("ad_group_id"),
            Column::string("android_deep_link"),
            Column::string_array("carousel_android_deep_links"),
            Column::string_array("carousel_destination_urls"),
            Column::string_array("carousel_ios_deep_links"),
            Column::string("click_tracking_url"),
            Column::string("creative_type"),
            Column::string("destination_url"),
            Column::string("ios_deep_link"),
            Column::boolean("is_pin_deleted"),
            Column::boolean("is_removable"),
            Column::string("name"),
            Column::string("pin_id"),
            Column::string("status"),
            tracking_urls(),
            Column::string("view_tracking_url"),
            Column::string("ad_account_id"),
            Column::string("campaign_id"),
            Column::string("collection_items_destination_url_template"),
            Column::number("created_time"),
            Column::string("id"),
            Column::string_array("rejected_reasons"),
            Column::string_array("rejection_labels"),
            Column::string("review_status"),
            Column::string("type"),
            Column::number("updated_time"),
            Column::string("summary_status"),
        ])
        .child_context(ContextProjection::new(vec![
            ContextField::required("ad_account_id", "ad_account_id"),
            ContextField::required("ad_id", "id"),
            ContextField::optional("ad_status", "status"),
        ]))
}

pub fn ad_analytics() -> StreamSpec {
    StreamSpec::new(
        "ad_analytics",
        "ad_accounts/{ad_account_id}/ads/analytics?ad_ids={ad_id}",
    )
    .parent("ads")
    .primary_key(&["AD_ID", "DATE"])
    .replication_key("DATE")
    .records_path("$[*]")
    .cursor(CursorStrategy::date_window())
    .columns(metric_columns(
        vec![Column::string("AD_ID"), Column::datetime("DATE")],
        AD_ANALYTICS_COLUMNS,
    ))
    .params(ParamsBuilder::analytics(AD_ANALYTICS_COLUMNS))
    .overrides(analytics_overrides())
    .state_partition_keys(&["ad_account_id", "ad_id"])
    .skip_rule(SkipRule::unless("ad_status", "ACTIVE"))
    .post_process(PostProcess::DateToTimestamp {
        field: "DATE".to_string(),
    })
}

pub fn account_analytics() -> StreamSpec {
    let columns = account_analytics_columns();
    StreamSpec::new("account_analytics", "ad_accounts/{ad_account_id}/analytics")
        .parent("ad_accounts")
        .primary_key(&["AD_ACCOUNT_ID", "DATE"])
        .replication_key("DATE")
        .records_path("$[*]")
        .cursor(CursorStrategy::date_window())
        .columns(metric_columns(
            vec![Column::string("AD_ACCOUNT_ID"), Column::datetime("DATE")],
            &columns,
        ))
        .params(ParamsBuilder::analytics(&columns))
        .overrides(analytics_overrides())
        .state_partition_keys(&["ad_account_id"])
        .post_process(PostProcess::DateToTimestamp {
            field: "DATE".to_string(),
        })
}

/// All streams in declared sync order
pub fn all() -> Vec<StreamSpec> {
    vec![
        ad_accounts(),
        campaigns(),
        ad_groups(),
        ads(),
        ad_analytics(),
        account_analytics(),
    ]
}
