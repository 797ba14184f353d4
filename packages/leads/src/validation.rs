// ABOUTME: Validation and normalisation of public form submissions
// ABOUTME: Each form maps onto a LeadCreateInput or a field-level ValidationError

use porchlight_core::validation::{MAX_ADDRESS_LEN, MAX_MESSAGE_LEN, MAX_NAME_LEN};
use porchlight_core::{clean_optional, normalize_email, normalize_phone, ValidationError, Validator};
use porchlight_timeline::{generate, parse_notice_date};

use crate::offers::types::{CashOfferInput, NewCashOffer};
use crate::types::{
    ContactFormInput, ExitIntentInput, GuideDownloadInput, LeadCreateInput, LeadSource,
    TimelineSignupInput, UtmParams,
};

const MAX_PAGE_LEN: usize = 500;
const MAX_UTM_LEN: usize = 100;
const MAX_SLUG_LEN: usize = 120;
const MAX_CITY_LEN: usize = 100;
const MAX_PROPERTY_TYPE_LEN: usize = 50;

fn check_utm(v: &mut Validator, utm: &UtmParams) {
    v.optional_max_len("utmSource", utm.utm_source.as_deref(), MAX_UTM_LEN)
        .optional_max_len("utmMedium", utm.utm_medium.as_deref(), MAX_UTM_LEN)
        .optional_max_len("utmCampaign", utm.utm_campaign.as_deref(), MAX_UTM_LEN);
}

fn clean_utm(utm: UtmParams) -> UtmParams {
    UtmParams {
        utm_source: clean_optional(utm.utm_source),
        utm_medium: clean_optional(utm.utm_medium),
        utm_campaign: clean_optional(utm.utm_campaign),
    }
}

pub fn contact_form(input: ContactFormInput) -> Result<LeadCreateInput, ValidationError> {
    let mut v = Validator::new();
    v.required("name", &input.name)
        .max_len("name", &input.name, MAX_NAME_LEN)
        .email("email", &input.email)
        .optional_phone("phone", input.phone.as_deref())
        .optional_max_len("propertyAddress", input.property_address.as_deref(), MAX_ADDRESS_LEN)
        .required("message", &input.message)
        .max_len("message", &input.message, MAX_MESSAGE_LEN)
        .optional_max_len("page", input.page.as_deref(), MAX_PAGE_LEN);
    check_utm(&mut v, &input.utm);
    v.finish()?;

    Ok(LeadCreateInput {
        source: LeadSource::ContactForm,
        name: clean_optional(Some(input.name)),
        email: normalize_email(&input.email),
        phone: input.phone.as_deref().and_then(normalize_phone),
        property_address: clean_optional(input.property_address),
        message: clean_optional(Some(input.message)),
        notice_date: None,
        page: clean_optional(input.page),
        utm: clean_utm(input.utm),
    })
}

pub fn exit_intent(input: ExitIntentInput) -> Result<LeadCreateInput, ValidationError> {
    let mut v = Validator::new();
    v.email("email", &input.email)
        .optional_max_len("name", input.name.as_deref(), MAX_NAME_LEN)
        .optional_max_len("page", input.page.as_deref(), MAX_PAGE_LEN);
    check_utm(&mut v, &input.utm);
    v.finish()?;

    let mut lead = LeadCreateInput::new(LeadSource::ExitIntent, normalize_email(&input.email));
    lead.name = clean_optional(input.name);
    lead.page = clean_optional(input.page);
    lead.utm = clean_utm(input.utm);
    Ok(lead)
}

pub fn timeline_signup(input: TimelineSignupInput) -> Result<LeadCreateInput, ValidationError> {
    let notice_date = parse_notice_date(&input.notice_date);
    // Every milestone must land on a representable date before anything is stored
    let fits_calendar = notice_date
        .as_ref()
        .map_or(true, |d| generate(*d, input.variant, *d).is_ok());

    let mut v = Validator::new();
    v.email("email", &input.email)
        .optional_max_len("name", input.name.as_deref(), MAX_NAME_LEN)
        .check(notice_date.is_ok(), "noticeDate", "must be a date in YYYY-MM-DD format")
        .check(fits_calendar, "noticeDate", "is outside the supported date range");
    check_utm(&mut v, &input.utm);
    v.finish()?;

    let mut lead = LeadCreateInput::new(LeadSource::TimelineCalculator, normalize_email(&input.email));
    lead.name = clean_optional(input.name);
    lead.notice_date = notice_date.ok();
    lead.utm = clean_utm(input.utm);
    Ok(lead)
}

pub fn guide_download(input: GuideDownloadInput) -> Result<LeadCreateInput, ValidationError> {
    let mut v = Validator::new();
    v.email("email", &input.email)
        .optional_max_len("name", input.name.as_deref(), MAX_NAME_LEN)
        .required("guideSlug", &input.guide_slug)
        .max_len("guideSlug", &input.guide_slug, MAX_SLUG_LEN);
    check_utm(&mut v, &input.utm);
    v.finish()?;

    let mut lead = LeadCreateInput::new(LeadSource::GuideDownload, normalize_email(&input.email));
    lead.name = clean_optional(input.name);
    lead.page = Some(format!("guide:{}", input.guide_slug.trim()));
    lead.utm = clean_utm(input.utm);
    Ok(lead)
}

pub fn cash_offer(input: CashOfferInput) -> Result<NewCashOffer, ValidationError> {
    let notice_date = input
        .notice_date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_notice_date)
        .transpose();

    let mut v = Validator::new();
    v.required("name", &input.name)
        .max_len("name", &input.name, MAX_NAME_LEN)
        .email("email", &input.email)
        .phone("phone", &input.phone)
        .required("propertyAddress", &input.property_address)
        .max_len("propertyAddress", &input.property_address, MAX_ADDRESS_LEN)
        .required("city", &input.city)
        .max_len("city", &input.city, MAX_CITY_LEN)
        .us_state("state", &input.state)
        .zip("zip", &input.zip)
        .required("propertyType", &input.property_type)
        .max_len("propertyType", &input.property_type, MAX_PROPERTY_TYPE_LEN)
        .optional_max_len("message", input.message.as_deref(), MAX_MESSAGE_LEN)
        .check(notice_date.is_ok(), "noticeDate", "must be a date in YYYY-MM-DD format");
    if let Some(bedrooms) = input.bedrooms {
        v.range("bedrooms", bedrooms, 0, 50);
    }
    if let Some(bathrooms) = input.bathrooms {
        v.check(
            (0.0..=50.0).contains(&bathrooms),
            "bathrooms",
            "must be between 0 and 50",
        );
    }
    if let Some(square_feet) = input.square_feet {
        v.range("squareFeet", square_feet, 100, 100_000);
    }
    if let Some(balance) = input.mortgage_balance {
        v.check(
            balance.is_finite() && balance >= 0.0,
            "mortgageBalance",
            "must be zero or more",
        );
    }
    check_utm(&mut v, &input.utm);
    v.finish()?;

    let notice_date = notice_date.ok().flatten();
    let name = input.name.trim().to_string();
    let email = normalize_email(&input.email);
    // Validated above, so normalisation always succeeds
    let phone = normalize_phone(&input.phone).unwrap_or_else(|| input.phone.trim().to_string());
    let utm = clean_utm(input.utm);

    let details = CashOfferInput {
        name: name.clone(),
        email: email.clone(),
        phone: phone.clone(),
        property_address: input.property_address.trim().to_string(),
        city: input.city.trim().to_string(),
        state: input.state.trim().to_uppercase(),
        zip: input.zip.trim().to_string(),
        property_type: input.property_type.trim().to_string(),
        bedrooms: input.bedrooms,
        bathrooms: input.bathrooms,
        square_feet: input.square_feet,
        condition: input.condition,
        sell_timeline: input.sell_timeline,
        mortgage_balance: input.mortgage_balance,
        in_foreclosure: input.in_foreclosure,
        notice_date: notice_date.map(|d| d.to_string()),
        message: clean_optional(input.message),
        utm: utm.clone(),
    };

    let lead = LeadCreateInput {
        source: LeadSource::CashOffer,
        name: Some(name),
        email,
        phone: Some(phone),
        property_address: Some(format!(
            "{}, {}, {} {}",
            details.property_address, details.city, details.state, details.zip
        )),
        message: details.message.clone(),
        notice_date,
        page: None,
        utm,
    };

    Ok(NewCashOffer {
        lead,
        details,
        notice_date,
    })
}
