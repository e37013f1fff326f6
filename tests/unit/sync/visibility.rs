use super::*;

#[test]
fn editing_and_interaction_take_precedence_over_a_ready_raster() {
    let all = StateInputs {
        editing: true,
        interacting: true,
        raster_current: true,
    };
    assert_eq!(SourceState::resolve(all), SourceState::EditingContent);
    assert_eq!(
        SourceState::resolve(StateInputs {
            editing: false,
            ..all
        }),
        SourceState::Interacting
    );
    assert_eq!(
        SourceState::resolve(StateInputs {
            raster_current: true,
            ..StateInputs::default()
        }),
        SourceState::RasterReady
    );
    assert_eq!(
        SourceState::resolve(StateInputs::default()),
        SourceState::RenderPending
    );
}

#[test]
fn only_pending_sources_accept_renders() {
    assert!(SourceState::RenderPending.accepts_renders());
    for s in [
        SourceState::EditingContent,
        SourceState::Interacting,
        SourceState::RasterReady,
    ] {
        assert!(!s.accepts_renders());
    }
}

#[test]
fn exactly_one_of_source_and_proxy_is_visible() {
    for state in [
        SourceState::EditingContent,
        SourceState::Interacting,
        SourceState::RenderPending,
        SourceState::RasterReady,
    ] {
        for covered in [false, true] {
            let v = Visibility::for_state(state, covered);
            assert_ne!(v.source_hidden, v.proxy_hidden, "{state:?} covered={covered}");
        }
    }
    let ready = Visibility::for_state(SourceState::RasterReady, false);
    assert!(ready.source_hidden && !ready.proxy_hidden);
    let covered = Visibility::for_state(SourceState::RasterReady, true);
    assert!(!covered.source_hidden && covered.proxy_hidden);
}
