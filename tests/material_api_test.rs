// ==========================================
// MaterialApi 集成测试
// ==========================================
// 测试目标: 查询、维护、领取状态、批量操作与清空口令
// ==========================================

mod test_helpers;

use material_tracker::api::{
    ApiError, BulkDeleteRequest, BulkUpdateRequest, DeleteAllRequest, MarkReceivedRequest, MaterialInput,
    SearchRequest,
};
use material_tracker::config::config_keys;
use test_helpers::{count_materials, create_test_state};

fn input(seat_number: &str, subject: &str, material: &str) -> MaterialInput {
    MaterialInput {
        seat_number: Some(seat_number.to_string()),
        subject_name: Some(subject.to_string()),
        material_name: Some(material.to_string()),
        hall: Some("A".to_string()),
        seat: Some("10".to_string()),
        stage: None,
    }
}

#[test]
fn test_search_orders_by_subject_then_material() {
    let (_temp_file, state) = create_test_state();
    let api = &state.material_api;

    api.create_material(input("1001", "Physics", "Lab")).unwrap();
    api.create_material(input("1001", "Math", "Sheet")).unwrap();
    api.create_material(input("1001", "Math", "Final")).unwrap();
    api.create_material(input("2002", "Math", "Final")).unwrap();

    let result = api
        .search(SearchRequest {
            seat_number: Some(" 1001 ".to_string()),
        })
        .unwrap();
    assert!(result.exists);
    assert_eq!(result.total_count, 3);
    let order: Vec<(&str, &str)> = result
        .materials
        .iter()
        .map(|m| (m.subject_name.as_str(), m.material_name.as_str()))
        .collect();
    assert_eq!(order, vec![("Math", "Final"), ("Math", "Sheet"), ("Physics", "Lab")]);

    let empty = api
        .search(SearchRequest {
            seat_number: Some("9999".to_string()),
        })
        .unwrap();
    assert!(!empty.exists);
    assert_eq!(empty.total_count, 0);

    let err = api.search(SearchRequest::default()).unwrap_err();
    assert_eq!(err.code(), "REQUEST_VALIDATION_ERROR");
}

#[test]
fn test_received_transition_keeps_invariant() {
    let (_temp_file, state) = create_test_state();
    let api = &state.material_api;
    let created = api.create_material(input("1001", "Math", "Final")).unwrap();

    let err = api
        .mark_received(created.id, MarkReceivedRequest { received_by: Some("  ".to_string()) })
        .unwrap_err();
    assert_eq!(err.code(), "REQUEST_VALIDATION_ERROR");

    let received = api
        .mark_received(
            created.id,
            MarkReceivedRequest {
                received_by: Some("proctor-7".to_string()),
            },
        )
        .unwrap();
    assert!(received.received);
    assert!(received.received_at.is_some());
    assert_eq!(received.received_by.as_deref(), Some("proctor-7"));

    // 更新不影响领取状态
    let updated = api.update_material(created.id, input("1001", "Math", "Final v2")).unwrap();
    assert!(updated.received);
    assert_eq!(updated.material_name, "Final v2");

    let cancelled = api.cancel_received(created.id).unwrap();
    assert!(!cancelled.received);
    assert_eq!(cancelled.received_at, None);
    assert_eq!(cancelled.received_by, None);
}

#[test]
fn test_get_and_delete_unknown_id() {
    let (_temp_file, state) = create_test_state();
    let api = &state.material_api;

    assert!(matches!(api.get_material(42), Err(ApiError::NotFound(_))));
    assert!(matches!(api.delete_material(42), Err(ApiError::NotFound(_))));

    let created = api.create_material(input("1001", "Math", "Final")).unwrap();
    api.delete_material(created.id).unwrap();
    assert!(matches!(api.get_material(created.id), Err(ApiError::NotFound(_))));
}

#[test]
fn test_bulk_update_whitelist_and_unknown_ids() {
    let (_temp_file, state) = create_test_state();
    let api = &state.material_api;
    let a = api.create_material(input("1", "Math", "Final")).unwrap();
    let b = api.create_material(input("2", "Math", "Final")).unwrap();

    let result = api
        .bulk_update(BulkUpdateRequest {
            ids: vec![a.id, b.id],
            field: Some("hall".to_string()),
            value: Some(" B ".to_string()),
        })
        .unwrap();
    assert_eq!(result.updated_count, 2);
    assert_eq!(api.get_material(a.id).unwrap().hall, "B");

    // 白名单之外的字段
    let err = api
        .bulk_update(BulkUpdateRequest {
            ids: vec![a.id],
            field: Some("received".to_string()),
            value: Some("1".to_string()),
        })
        .unwrap_err();
    assert_eq!(err.code(), "REQUEST_VALIDATION_ERROR");

    // 任一 id 不存在则整体拒绝
    let err = api
        .bulk_update(BulkUpdateRequest {
            ids: vec![a.id, 999],
            field: Some("seat".to_string()),
            value: Some("77".to_string()),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(api.get_material(a.id).unwrap().seat, "10");

    // 只有 stage 可以清空
    let cleared = api
        .bulk_update(BulkUpdateRequest {
            ids: vec![a.id],
            field: Some("stage".to_string()),
            value: Some("".to_string()),
        })
        .unwrap();
    assert_eq!(cleared.updated_count, 1);
    let err = api
        .bulk_update(BulkUpdateRequest {
            ids: vec![a.id],
            field: Some("hall".to_string()),
            value: Some("".to_string()),
        })
        .unwrap_err();
    assert_eq!(err.code(), "REQUEST_VALIDATION_ERROR");
}

#[test]
fn test_bulk_delete_ignores_unknown_ids() {
    let (_temp_file, state) = create_test_state();
    let api = &state.material_api;
    let a = api.create_material(input("1", "Math", "Final")).unwrap();
    api.create_material(input("2", "Math", "Final")).unwrap();

    let result = api
        .bulk_delete(BulkDeleteRequest { ids: vec![a.id, 999] })
        .unwrap();
    assert_eq!(result.deleted_count, 1);
    assert_eq!(count_materials(&state.db_path), 1);

    assert!(api.bulk_delete(BulkDeleteRequest::default()).is_err());
}

#[test]
fn test_delete_all_requires_password() {
    let (_temp_file, state) = create_test_state();
    let api = &state.material_api;
    api.create_material(input("1", "Math", "Final")).unwrap();
    api.create_material(input("2", "Math", "Final")).unwrap();

    let err = api.delete_all(DeleteAllRequest::default()).unwrap_err();
    assert_eq!(err.code(), "REQUEST_VALIDATION_ERROR");

    let err = api
        .delete_all(DeleteAllRequest {
            password: Some("wrong".to_string()),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert_eq!(count_materials(&state.db_path), 2);

    let result = api
        .delete_all(DeleteAllRequest {
            password: Some("123".to_string()),
        })
        .unwrap();
    assert_eq!(result.deleted_count, 2);
    assert_eq!(count_materials(&state.db_path), 0);
}

#[test]
fn test_delete_all_password_from_config() {
    let (_temp_file, state) = create_test_state();
    state
        .config_manager
        .set_config_value(config_keys::DELETE_ALL_PASSWORD, "s3cret")
        .unwrap();

    let err = state
        .material_api
        .delete_all(DeleteAllRequest {
            password: Some("123".to_string()),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));

    let result = state
        .material_api
        .delete_all(DeleteAllRequest {
            password: Some("s3cret".to_string()),
        })
        .unwrap();
    assert_eq!(result.deleted_count, 0);
}
