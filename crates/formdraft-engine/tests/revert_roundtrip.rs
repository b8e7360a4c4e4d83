use formdraft_engine::{capture, EngineSettings, FormControl, FormHost, RecoveryForm};
use formdraft_model::{FieldValue, Snapshot, CSRF_FIELD, RECOVERY_MARKER_FIELD};
use formdraft_test_utils::{inputs, snapshot, FakeForm};
use proptest::prelude::*;

/// What the server renders back from a recovery submission: the enabled
/// controls of the rebuilt form.
fn rerender(form: &RecoveryForm) -> FakeForm {
    FakeForm::new(
        form.controls()
            .iter()
            .filter(|c| !c.disabled)
            .cloned()
            .collect(),
    )
}

fn field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        "[a-z ]{0,8}".prop_map(FieldValue::Single),
        prop::collection::vec("[a-z]{1,4}", 1..4).prop_map(FieldValue::Multi),
    ]
}

fn draft_snapshot() -> impl Strategy<Value = Snapshot> {
    prop::collection::vec(("[a-e]{1,3}", field_value()), 0..8).prop_map(|fields| {
        fields
            .into_iter()
            .fold(Snapshot::new(), |s, (name, value)| s.with_field(name, value))
    })
}

proptest! {
    #[test]
    fn reconstructed_form_recaptures_to_the_draft(
        draft in draft_snapshot(),
        token in "[A-Za-z0-9]{8}",
    ) {
        let settings = EngineSettings::default();
        let page = FakeForm::new(
            std::iter::once(FormControl::hidden(CSRF_FIELD, token.clone()))
                .chain(inputs(&[("title", "live"), ("slug", "live-slug")]))
                .collect(),
        );
        let form = RecoveryForm::build(
            page.controls(),
            &draft,
            page.csrf_token(CSRF_FIELD).as_deref(),
            &settings,
        );

        let recaptured = capture(&rerender(&form).controls(), CSRF_FIELD);
        prop_assert_eq!(recaptured.without(RECOVERY_MARKER_FIELD), draft.without(CSRF_FIELD));
    }
}

#[test]
fn test_unchecked_checkbox_round_trips_as_absence() {
    let page = FakeForm::new(vec![
        FormControl::input("title", "Hello"),
        FormControl::checkbox("featured", "on", false),
        FormControl::checkbox("pinned", "yes", true),
    ]);
    let draft = capture(&page.controls(), CSRF_FIELD);
    assert_eq!(draft, snapshot(&[("title", "Hello"), ("pinned", "yes")]));

    let form = RecoveryForm::build(page.controls(), &draft, None, &EngineSettings::default());
    let recaptured = capture(&rerender(&form).controls(), CSRF_FIELD);
    assert_eq!(recaptured.without(RECOVERY_MARKER_FIELD), draft);
    assert!(recaptured.get("featured").is_none());
}

#[test]
fn test_stale_draft_token_never_reaches_the_server() {
    let page = FakeForm::new(vec![FormControl::hidden(CSRF_FIELD, "fresh")]);
    let draft = snapshot(&[(CSRF_FIELD, "stale"), ("title", "Draft")]);

    let form = RecoveryForm::build(
        page.controls(),
        &draft,
        page.csrf_token(CSRF_FIELD).as_deref(),
        &EngineSettings::default(),
    );

    let tokens: Vec<_> = form
        .payload()
        .into_iter()
        .filter(|(name, _)| name == CSRF_FIELD)
        .map(|(_, value)| value)
        .collect();
    assert_eq!(tokens, vec!["fresh".to_string()]);
}
