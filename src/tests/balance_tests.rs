use crate::constants::BALANCE_TOLERANCE;
use crate::core::models::user::SettlementMode;
use crate::tests::{create_test_context, setup_pair, shares};

#[tokio::test]
async fn simple_pair_balances() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;

    ctx.service
        .add_expense(
            &group.id,
            &alice.id,
            100.0,
            "USD".to_string(),
            "food".to_string(),
            "Dinner".to_string(),
            shares(&[(&alice.id, 50.0), (&bob.id, 50.0)]),
            &alice.id,
        )
        .await
        .unwrap();

    let balances = ctx.service.get_group_balances(&group.id).await.unwrap();
    let alice_balance = balances.iter().find(|b| b.user_id == alice.id).unwrap();
    let bob_balance = balances.iter().find(|b| b.user_id == bob.id).unwrap();

    assert_eq!(alice_balance.total_paid, 100.0);
    assert_eq!(alice_balance.total_owed, 50.0);
    assert_eq!(alice_balance.net, 50.0);
    assert!(alice_balance.is_owed);
    assert!(!alice_balance.owes);
    assert_eq!(alice_balance.username, "Alice");

    assert_eq!(bob_balance.net, -50.0);
    assert!(bob_balance.owes);
    assert!(!bob_balance.is_settled);
}

#[tokio::test]
async fn group_balances_sum_to_zero() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;
    let carol = ctx
        .service
        .create_user("Carol".to_string(), "carol@example.com".to_string())
        .await
        .unwrap();
    ctx.service
        .add_member_to_group(&group.id, &carol.id, &alice.id)
        .await
        .unwrap();

    ctx.service
        .add_expense(
            &group.id,
            &alice.id,
            90.0,
            "USD".to_string(),
            "rent".to_string(),
            String::new(),
            shares(&[(&alice.id, 30.0), (&bob.id, 30.0), (&carol.id, 30.0)]),
            &alice.id,
        )
        .await
        .unwrap();
    ctx.service
        .add_expense(
            &group.id,
            &bob.id,
            45.5,
            "USD".to_string(),
            "food".to_string(),
            String::new(),
            shares(&[(&bob.id, 20.5), (&carol.id, 25.0)]),
            &bob.id,
        )
        .await
        .unwrap();

    let settlement = ctx
        .service
        .record_settlement(&group.id, &carol.id, &alice.id, 30.0, None)
        .await
        .unwrap();
    ctx.service.accept_settlement(&settlement.id, &alice.id).await.unwrap();

    let balances = ctx.service.get_group_balances(&group.id).await.unwrap();
    let total: f64 = balances.iter().map(|b| b.net).sum();
    assert!(total.abs() <= BALANCE_TOLERANCE, "group sum was {}", total);
}

#[tokio::test]
async fn balances_are_idempotent_without_writes() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;

    ctx.service
        .add_expense(
            &group.id,
            &alice.id,
            33.33,
            "USD".to_string(),
            "misc".to_string(),
            String::new(),
            shares(&[(&alice.id, 11.11), (&bob.id, 22.22)]),
            &alice.id,
        )
        .await
        .unwrap();

    let first = ctx.service.get_group_balances(&group.id).await.unwrap();
    let second = ctx.service.get_group_balances(&group.id).await.unwrap();
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[tokio::test]
async fn pending_settlement_does_not_move_balances() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;

    ctx.service
        .add_expense(
            &group.id,
            &alice.id,
            100.0,
            "USD".to_string(),
            "food".to_string(),
            String::new(),
            shares(&[(&alice.id, 50.0), (&bob.id, 50.0)]),
            &alice.id,
        )
        .await
        .unwrap();

    let settlement = ctx
        .service
        .record_settlement(&group.id, &bob.id, &alice.id, 50.0, None)
        .await
        .unwrap();

    let balances = ctx.service.get_group_balances(&group.id).await.unwrap();
    let bob_balance = balances.iter().find(|b| b.user_id == bob.id).unwrap();
    assert_eq!(bob_balance.net, -50.0);
    assert_eq!(bob_balance.paid_settlements, 0.0);

    // Rejected settlements stay out of the books too.
    ctx.service
        .reject_settlement(&settlement.id, &alice.id, Some("cash instead".to_string()))
        .await
        .unwrap();
    let balances = ctx.service.get_group_balances(&group.id).await.unwrap();
    let bob_balance = balances.iter().find(|b| b.user_id == bob.id).unwrap();
    assert_eq!(bob_balance.net, -50.0);

    // Acceptance is what moves the needle.
    let second = ctx
        .service
        .record_settlement(&group.id, &bob.id, &alice.id, 50.0, None)
        .await
        .unwrap();
    ctx.service.accept_settlement(&second.id, &alice.id).await.unwrap();
    let balances = ctx.service.get_group_balances(&group.id).await.unwrap();
    let bob_balance = balances.iter().find(|b| b.user_id == bob.id).unwrap();
    assert!(bob_balance.is_settled);
    assert_eq!(bob_balance.paid_settlements, 50.0);
}

#[tokio::test]
async fn auto_adjust_folds_accepted_global_settlement() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;

    ctx.service
        .add_expense(
            &group.id,
            &alice.id,
            100.0,
            "USD".to_string(),
            "food".to_string(),
            String::new(),
            shares(&[(&alice.id, 50.0), (&bob.id, 50.0)]),
            &alice.id,
        )
        .await
        .unwrap();

    ctx.service
        .set_settlement_mode(&alice.id, SettlementMode::AutoAdjust)
        .await
        .unwrap();
    let global = ctx
        .service
        .record_global_settlement(&alice.id, &bob.id, 20.0, None)
        .await
        .unwrap();
    ctx.service.accept_settlement(&global.id, &bob.id).await.unwrap();

    let balances = ctx.service.get_group_balances(&group.id).await.unwrap();
    let alice_balance = balances.iter().find(|b| b.user_id == alice.id).unwrap();
    assert_eq!(alice_balance.original_net, 50.0);
    assert_eq!(alice_balance.global_adjustment, -20.0);
    assert_eq!(alice_balance.net, 30.0);

    // Bob stays in separate mode, so the same global settlement does not
    // leak into his view.
    let bob_balance = balances.iter().find(|b| b.user_id == bob.id).unwrap();
    assert_eq!(bob_balance.net, -50.0);
    assert_eq!(bob_balance.global_adjustment, 0.0);
}

#[tokio::test]
async fn hybrid_exposes_adjustment_without_changing_net() {
    let ctx = create_test_context();
    let (alice, bob, group) = setup_pair(&ctx).await;

    ctx.service
        .add_expense(
            &group.id,
            &alice.id,
            100.0,
            "USD".to_string(),
            "food".to_string(),
            String::new(),
            shares(&[(&alice.id, 50.0), (&bob.id, 50.0)]),
            &alice.id,
        )
        .await
        .unwrap();

    ctx.service
        .set_settlement_mode(&alice.id, SettlementMode::Hybrid)
        .await
        .unwrap();
    let global = ctx
        .service
        .record_global_settlement(&alice.id, &bob.id, 20.0, None)
        .await
        .unwrap();
    ctx.service.accept_settlement(&global.id, &bob.id).await.unwrap();

    let balances = ctx.service.get_group_balances(&group.id).await.unwrap();
    let alice_balance = balances.iter().find(|b| b.user_id == alice.id).unwrap();
    assert_eq!(alice_balance.net, 50.0);
    assert_eq!(alice_balance.original_net, 50.0);
    assert_eq!(alice_balance.global_adjustment, -20.0);
    assert!(alice_balance.is_owed);
}
