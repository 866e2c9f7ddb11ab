#[path = "common/mod.rs"]
mod common;

use axum::http::StatusCode;

use common::{Calls, admin_cookie, form_as, get_as, multipart_as, send, spawn_app};

#[tokio::test]
async fn consolidated_view_lists_every_unmapped_entry() {
    let t = spawn_app().await;
    let (status, _, body) = send(&t.app, get_as("/works/12", &admin_cookie())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Acme Traders Pvt Ltd"));
    assert!(body.contains("HDFC Current Account"));
    assert!(body.contains("Office Rent"));
    assert!(body.contains("2,50,000.00"));
    assert!(body.contains("Balances with Banks"));
}

#[tokio::test]
async fn unit_view_is_upload_only_and_lists_versions() {
    let t = spawn_app().await;
    let (status, _, body) = send(&t.app, get_as("/works/12?unit=1", &admin_cookie())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("HDFC Current Account"));
    assert!(body.contains("Upload trial balance"));
    assert_eq!(body.matches("<td>v").count(), 1);
    assert!(body.contains("<td>v1</td><td class=\"num\">42</td><td>current</td>"));
}

#[tokio::test]
async fn upload_leaves_one_current_version_with_its_row_count() {
    let t = spawn_app().await;
    let (_, _, body) = send(&t.app, get_as("/works/12?unit=2", &admin_cookie())).await;
    assert!(body.contains("No trial balance uploaded for this unit."));

    let req = multipart_as(
        "/works/12/trial-balance",
        &admin_cookie(),
        &[("unit", "2")],
        Some(("delhi.xlsx", b"rows")),
    );
    let (status, location, _) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let location = location.unwrap();
    let back = location.to_str().unwrap();
    assert_eq!(back, "/works/12?mode=mapping&unit=2");

    let (status, _, body) = send(&t.app, get_as(back, &admin_cookie())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.matches("<td>v").count(), 1);
    assert_eq!(body.matches("<td>current</td>").count(), 1);
    assert!(body.contains("<td>v1</td><td class=\"num\">42</td><td>current</td>"));
}

#[tokio::test]
async fn pages_carry_their_view_id_in_links_and_forms() {
    let t = spawn_app().await;
    let (_, _, body) = send(&t.app, get_as("/works/12?view=41", &admin_cookie())).await;
    assert!(body.contains("name=\"view\" value=\"41\""));
    assert!(body.contains("/works/12?mode=reports&amp;view=41"));
}

#[tokio::test]
async fn two_tabs_of_one_session_load_side_by_side() {
    let t = spawn_app().await;
    let cookie = admin_cookie();
    let (first, second) = tokio::join!(
        send(&t.app, get_as("/works/12", &cookie)),
        send(&t.app, get_as("/works/12?unit=1", &cookie)),
    );
    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);
    assert!(first.2.contains("HDFC Current Account"));
    assert!(second.2.contains("Upload trial balance"));
}

#[tokio::test]
async fn unknown_unit_falls_back_to_consolidated() {
    let t = spawn_app().await;
    let (status, _, body) = send(&t.app, get_as("/works/12?unit=99", &admin_cookie())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("HDFC Current Account"));
    assert!(!body.contains("Upload trial balance"));
}

#[tokio::test]
async fn missing_work_is_not_found() {
    let t = spawn_app().await;
    let (status, _, _) = send(&t.app, get_as("/works/99", &admin_cookie())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rejected_mapping_keeps_the_entry_on_screen() {
    let t = spawn_app().await;
    let req = form_as("/works/12/map", &admin_cookie(), "entry_id=101&account_id=11");
    let (status, _, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(Calls::count(&t.calls.map_entry), 1);
    assert!(body.contains("mapping rejected"));
    assert!(body.contains("HDFC Current Account"));
}

#[tokio::test]
async fn overlapping_mappings_each_reach_the_api() {
    let t = spawn_app().await;
    let cookie = admin_cookie();
    let (refused, accepted) = tokio::join!(
        send(&t.app, form_as("/works/12/map", &cookie, "entry_id=101&account_id=11&view=5")),
        send(&t.app, form_as("/works/12/map", &cookie, "entry_id=102&account_id=11&view=5")),
    );
    assert_eq!(Calls::count(&t.calls.map_entry), 2);

    assert_eq!(refused.0, StatusCode::OK);
    assert!(refused.2.contains("mapping rejected"));
    assert!(refused.2.contains("HDFC Current Account"));

    assert_eq!(accepted.0, StatusCode::SEE_OTHER);
    assert_eq!(accepted.1.unwrap(), "/works/12?mode=mapping&view=5");
}

#[tokio::test]
async fn finalized_work_shows_inert_controls() {
    let t = spawn_app().await;
    let (status, _, body) = send(&t.app, get_as("/works/13", &admin_cookie())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("UDIN 23123456ABCDEF1234"));
    assert!(body.contains("<button type=\"submit\" disabled>Add unit</button>"));
    assert!(body.contains("HDFC Current Account"));
    assert!(body.contains("<button type=\"submit\" disabled>Map</button>"));
    assert!(!body.contains("Finalize work"));

    let (_, _, body) = send(&t.app, get_as("/works/13?unit=1", &admin_cookie())).await;
    assert!(body.contains("<button type=\"submit\" disabled>Upload trial balance</button>"));

    let req = form_as("/works/13/map", &admin_cookie(), "entry_id=102&account_id=11");
    let (status, _, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("this work is finalized"));
    assert_eq!(Calls::count(&t.calls.map_entry), 0);
}

#[tokio::test]
async fn mapping_to_a_head_never_reaches_the_api() {
    let t = spawn_app().await;
    let req = form_as("/works/12/map", &admin_cookie(), "entry_id=101&account_id=10");
    let (status, _, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(Calls::count(&t.calls.map_entry), 0);
    assert!(body.contains("is not a sub-head"));
}

#[tokio::test]
async fn finalize_without_certificate_makes_no_request() {
    let t = spawn_app().await;
    let req = multipart_as(
        "/works/12/finalize",
        &admin_cookie(),
        &[("udin", "24123456ABCDEF1234"), ("signing_date", "2025-05-01")],
        None,
    );
    let (status, location, _) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(Calls::count(&t.calls.work_reads), 0);
    assert_eq!(Calls::count(&t.calls.finalize), 0);

    let location = location.unwrap();
    let back = location.to_str().unwrap();
    assert!(back.starts_with("/works/12?mode=mapping&alert="));
    let (_, _, body) = send(&t.app, get_as(back, &admin_cookie())).await;
    assert!(body.contains("the signed certificate file must be attached"));
}

#[tokio::test]
async fn finalize_rejects_malformed_udin() {
    let t = spawn_app().await;
    let req = multipart_as(
        "/works/12/finalize",
        &admin_cookie(),
        &[("udin", "1234"), ("signing_date", "2025-05-01")],
        Some(("certificate.pdf", b"%PDF-1.4")),
    );
    let (status, location, _) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(Calls::count(&t.calls.work_reads), 0);
    assert_eq!(Calls::count(&t.calls.finalize), 0);

    let location = location.unwrap();
    let (_, _, body) = send(&t.app, get_as(location.to_str().unwrap(), &admin_cookie())).await;
    assert!(body.contains("UDIN must be 18 characters"));
}

#[tokio::test]
async fn finalize_with_valid_input_redirects_back() {
    let t = spawn_app().await;
    let req = multipart_as(
        "/works/12/finalize",
        &admin_cookie(),
        &[("udin", "24123456abcdef1234"), ("signing_date", "2025-05-01")],
        Some(("certificate.pdf", b"%PDF-1.4")),
    );
    let (status, location, _) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.unwrap(), "/works/12");
    assert_eq!(Calls::count(&t.calls.finalize), 1);
}

#[tokio::test]
async fn upload_needs_a_unit() {
    let t = spawn_app().await;
    let req = multipart_as("/works/12/trial-balance", &admin_cookie(), &[], Some(("tb.xlsx", b"rows")));
    let (status, _, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("select a unit before uploading"));
    assert_eq!(Calls::count(&t.calls.upload), 0);

    let req = multipart_as(
        "/works/12/trial-balance",
        &admin_cookie(),
        &[("unit", "1")],
        Some(("tb.xlsx", b"rows")),
    );
    let (status, location, _) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.unwrap(), "/works/12?mode=mapping&unit=1");
    assert_eq!(Calls::count(&t.calls.upload), 1);
}

#[tokio::test]
async fn reports_recommend_templates_for_the_client_type() {
    let t = spawn_app().await;
    let (status, _, body) = send(&t.app, get_as("/works/12?mode=reports", &admin_cookie())).await;
    assert_eq!(status, StatusCode::OK);
    let recommended = body.find("Schedule III Balance Sheet").unwrap();
    let other_heading = body.find("<summary>Other templates (1)</summary>").unwrap();
    let other = body.find("LLP Balance Sheet").unwrap();
    assert!(recommended < other_heading && other_heading < other);
}

#[tokio::test]
async fn preview_renders_pages_and_saved_notes() {
    let t = spawn_app().await;
    let (status, _, body) = send(&t.app, get_as("/works/12?mode=preview&template=7", &admin_cookie())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("BALANCE SHEET"));
    assert!(body.contains("12,34,567.50"));
    assert!(body.contains("Total Current Assets"));
    // Zero balance and not mandatory.
    assert!(!body.contains("Inventories"));
    assert!(body.contains("Balances confirmed with bank statements."));
}

#[tokio::test]
async fn preview_without_template_shows_reports() {
    let t = spawn_app().await;
    let (status, _, body) = send(&t.app, get_as("/works/12?mode=preview", &admin_cookie())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Recommended templates"));
}

#[tokio::test]
async fn background_note_save_answers_no_content() {
    let t = spawn_app().await;
    let req = form_as("/works/12/notes", &admin_cookie(), "note_ref=3&text=Reconciled");
    let (status, _, _) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(Calls::count(&t.calls.report_config_saves), 1);
}

#[tokio::test]
async fn statement_download_only_accepts_pdf_or_xlsx() {
    let t = spawn_app().await;
    let (status, _, _) = send(
        &t.app,
        get_as("/works/12/statements/7/download?format=docx", &admin_cookie()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
