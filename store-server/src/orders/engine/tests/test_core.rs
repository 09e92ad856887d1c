use super::*;
use shared::ErrorCode;

#[tokio::test]
async fn test_new_order_reserves_stock() {
    let ctx = test_ctx();
    ctx.seed();

    let order_id = ctx.order(&[("b1", 2)]);

    assert_eq!(ctx.stock("b1"), 3);
    assert_eq!(ctx.status(&order_id), OrderStatus::Pending);
    assert_eq!(ctx.engine.storage().active_order_ids().unwrap(), vec![order_id.clone()]);
    assert_eq!(ctx.engine.armed_timers(), 1);

    // Line price is unit price × count, snapshotted at creation
    let lines = ctx.engine.storage().order_lines(&order_id).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].count, 2);
    assert_eq!(lines[0].price, Decimal::from(20));
}

#[tokio::test]
async fn test_new_order_multiple_items() {
    let ctx = test_ctx();
    ctx.seed();

    let order_id = ctx.order(&[("b1", 1), ("b2", 2)]);

    assert_eq!(ctx.stock("b1"), 4);
    assert_eq!(ctx.stock("b2"), 1);

    let total: Decimal = ctx
        .engine
        .storage()
        .order_lines(&order_id)
        .unwrap()
        .iter()
        .map(|l| l.price)
        .sum();
    assert_eq!(total, Decimal::from(50)); // 1×10 + 2×20
}

#[tokio::test]
async fn test_new_order_unknown_user() {
    let ctx = test_ctx();
    ctx.seed();

    let err = ctx
        .engine
        .new_order("ghost", STORE, &[OrderDraftItem::new("b1", 1)])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UserNotFound);
    assert_eq!(ctx.stock("b1"), 5);
}

#[tokio::test]
async fn test_new_order_unknown_store() {
    let ctx = test_ctx();
    ctx.seed();

    let err = ctx
        .engine
        .new_order(BUYER, "nope", &[OrderDraftItem::new("b1", 1)])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StoreNotFound);
}

#[tokio::test]
async fn test_new_order_unknown_book() {
    let ctx = test_ctx();
    ctx.seed();

    let err = ctx
        .engine
        .new_order(BUYER, STORE, &[OrderDraftItem::new("b9", 1)])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BookNotFound);
    assert_eq!(err.details.unwrap().get("book_id").unwrap(), "b9");
}

#[tokio::test]
async fn test_new_order_insufficient_stock() {
    let ctx = test_ctx();
    ctx.seed();

    let err = ctx
        .engine
        .new_order(BUYER, STORE, &[OrderDraftItem::new("b1", 6)])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StockInsufficient);
    assert_eq!(ctx.stock("b1"), 5);
    assert!(ctx.engine.storage().active_order_ids().unwrap().is_empty());
}

#[tokio::test]
async fn test_new_order_rolls_back_partial_reservation() {
    let ctx = test_ctx();
    ctx.seed();

    // b1 succeeds, b2 fails: the b1 decrement must be compensated
    let err = ctx
        .engine
        .new_order(
            BUYER,
            STORE,
            &[OrderDraftItem::new("b1", 2), OrderDraftItem::new("b2", 9)],
        )
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StockInsufficient);

    assert_eq!(ctx.stock("b1"), 5);
    assert_eq!(ctx.stock("b2"), 3);
    assert!(ctx.engine.storage().active_order_ids().unwrap().is_empty());
    assert_eq!(ctx.engine.armed_timers(), 0);
}

#[tokio::test]
async fn test_new_order_rejects_bad_input() {
    let ctx = test_ctx();
    ctx.seed();

    let err = ctx.engine.new_order(BUYER, STORE, &[]).unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    let err = ctx
        .engine
        .new_order(BUYER, STORE, &[OrderDraftItem::new("b1", 0)])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
    assert_eq!(ctx.stock("b1"), 5);
}

#[tokio::test]
async fn test_order_ids_are_unique() {
    let ctx = test_ctx();
    ctx.seed();

    let a = ctx.order(&[("b1", 1)]);
    let b = ctx.order(&[("b1", 1)]);
    assert_ne!(a, b);
    assert_eq!(ctx.engine.armed_timers(), 2);
}
