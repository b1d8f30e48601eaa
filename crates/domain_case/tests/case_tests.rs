//! Workflow tests for domain_case, run against the in-memory ports

use rust_decimal_macros::dec;

use core_kernel::{BranchId, CaseId, ChargeId, PaymentId, UserId};
use domain_billing::{ChargeType, PricingModel, ReceiptType};
use domain_case::ports::mock::StoreOperation;
use domain_case::{
    AddChargeRequest, CaseDetailsUpdate, CaseError, CaseQuery, CaseStatus, CreateBranchRequest,
    FoundReceipt, RequestContext, StaleView, UpsertServiceRequest,
};

use test_utils::{
    assert_duplicate_error, assert_financials_consistent, assert_money_eq, assert_money_zero,
    assert_not_found, assert_validation_error, AdmissionRequestBuilder, BranchFixtures,
    DateFixtures, DischargeRequestBuilder, PaymentRequestBuilder, TestHarness,
};

// ============================================================================
// Admission
// ============================================================================

mod admission_tests {
    use super::*;

    #[tokio::test]
    async fn test_admission_generates_embalming_and_coldroom_charges() {
        let h = TestHarness::new().await;
        let result = h.admit("TAG-001").await;

        assert!(result.charges_generated);
        assert!(result.charge_warning.is_none());
        assert_eq!(result.initial_charges.len(), 2);

        let embalming = &result.initial_charges[0];
        assert_eq!(embalming.charge_type, ChargeType::Embalming);
        assert_eq!(embalming.quantity, dec!(1));
        assert_money_eq(&embalming.amount, dec!(500.00));
        assert!(embalming.auto_generated);

        let coldroom = &result.initial_charges[1];
        assert_eq!(coldroom.charge_type, ChargeType::Coldroom);
        assert_eq!(coldroom.quantity, dec!(1));
        assert_money_eq(&coldroom.amount, dec!(30.00));

        assert_eq!(result.case.status, CaseStatus::InCustody);
        assert_money_eq(&result.case.financials.total_bill, dec!(530.00));
        assert_money_eq(&result.case.financials.balance, dec!(530.00));
        assert_financials_consistent(&result.case);
    }

    #[tokio::test]
    async fn test_admission_without_matching_services_succeeds() {
        let h = TestHarness::without_matching_catalog().await;
        let result = h.admit("TAG-002").await;

        assert!(!result.charges_generated);
        assert!(result.charge_warning.is_none());
        assert!(result.initial_charges.is_empty());
        assert_money_zero(&result.case.financials.total_bill);
        assert!(h.store.charges_of(result.case_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_catalog_failure_keeps_case_and_reports_warning() {
        let h = TestHarness::new().await;
        h.store.fail_on(StoreOperation::ListServices).await;

        let result = h.admit("TAG-003").await;

        assert!(!result.charges_generated);
        assert!(result.charge_warning.is_some());
        assert_eq!(h.store.case_count().await, 1);
        assert_eq!(result.case.status, CaseStatus::InCustody);
    }

    #[tokio::test]
    async fn test_charge_insert_failure_keeps_case() {
        let h = TestHarness::new().await;
        h.store.fail_on(StoreOperation::InsertCharges).await;

        let result = h.admit("TAG-004").await;

        assert!(!result.charges_generated);
        assert!(result.charge_warning.is_some());
        assert!(h.store.charges_of(result.case_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_tag_in_same_branch_rejected() {
        let h = TestHarness::new().await;
        h.admit("TAG-010").await;

        let result = h
            .services
            .admission
            .admit(&h.ctx, AdmissionRequestBuilder::new(h.branch.id).with_tag("TAG-010").build())
            .await;

        assert_duplicate_error(result, "Tag number already exists");
        assert_eq!(h.store.case_count().await, 1);
    }

    #[tokio::test]
    async fn test_same_tag_allowed_in_other_branch() {
        let h = TestHarness::new().await;
        h.admit("TAG-011").await;

        let admin = h.admin_ctx();
        let other = h
            .services
            .settings
            .create_branch(
                &admin,
                CreateBranchRequest {
                    name: "Kumasi".to_string(),
                    code: "KSI".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let result = h
            .services
            .admission
            .admit(&admin, AdmissionRequestBuilder::new(other.id).with_tag("TAG-011").build())
            .await
            .unwrap();

        assert_eq!(result.case.branch_id, other.id);
        assert_eq!(h.store.case_count().await, 2);
    }

    #[tokio::test]
    async fn test_missing_required_fields_listed() {
        let h = TestHarness::new().await;
        let request = AdmissionRequestBuilder::new(h.branch.id)
            .with_tag("  ")
            .with_relative("", "")
            .build();

        let result = h.services.admission.admit(&h.ctx, request).await;

        match result {
            Err(CaseError::Validation { message, field }) => {
                assert_eq!(message, "Missing required fields: tag_no, relative_name, relative_contact");
                assert_eq!(field.as_deref(), Some("tag_no"));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
        assert_eq!(h.store.case_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_branch_rejected() {
        let h = TestHarness::new().await;
        let result = h
            .services
            .admission
            .admit(&h.ctx, AdmissionRequestBuilder::new(h.branch.id).without_branch().build())
            .await;

        assert_validation_error(result, Some("branch_id"));
    }

    #[tokio::test]
    async fn test_negative_age_rejected() {
        let h = TestHarness::new().await;
        let result = h
            .services
            .admission
            .admit(&h.ctx, AdmissionRequestBuilder::new(h.branch.id).with_age(Some(-3)).build())
            .await;

        assert_validation_error(result, Some("age"));
    }

    #[tokio::test]
    async fn test_admission_invalidates_list_and_dashboard() {
        let h = TestHarness::new().await;
        h.admit("TAG-012").await;

        assert!(h.invalidator.contains(&StaleView::CaseList { branch_id: h.branch.id }));
        assert!(h.invalidator.contains(&StaleView::Dashboard { branch_id: h.branch.id }));
    }
}

// ============================================================================
// Charges
// ============================================================================

mod ledger_tests {
    use super::*;

    fn charge_request(h: &TestHarness, case_id: CaseId, amount: rust_decimal::Decimal) -> AddChargeRequest {
        AddChargeRequest {
            case_id,
            branch_id: h.branch.id,
            description: "Storage extension".to_string(),
            amount,
            charge_type: Some(ChargeType::Storage),
        }
    }

    #[tokio::test]
    async fn test_add_charge_updates_snapshot() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-020").await;

        let charge = h
            .services
            .ledger
            .add_charge(&h.ctx, charge_request(&h, admitted.case_id, dec!(90.00)))
            .await
            .unwrap();

        assert!(!charge.auto_generated);
        assert_eq!(charge.charge_type, ChargeType::Storage);

        let case = h.services.registry.get_case(&h.ctx, h.branch.id, admitted.case_id).await.unwrap();
        assert_money_eq(&case.financials.total_bill, dec!(620.00));
        assert_money_eq(&case.financials.storage_fee, dec!(90.00));
        assert_financials_consistent(&case);
        assert!(h.invalidator.contains(&StaleView::CaseDetail {
            branch_id: h.branch.id,
            case_id: admitted.case_id,
        }));
    }

    #[tokio::test]
    async fn test_add_charge_with_blank_description_rejected() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-021").await;
        let mut request = charge_request(&h, admitted.case_id, dec!(10));
        request.description = "   ".to_string();

        let result = h.services.ledger.add_charge(&h.ctx, request).await;
        assert_validation_error(result, Some("description"));
    }

    #[tokio::test]
    async fn test_add_charge_to_unknown_case_not_found() {
        let h = TestHarness::new().await;
        let result = h
            .services
            .ledger
            .add_charge(&h.ctx, charge_request(&h, CaseId::new(), dec!(10)))
            .await;

        assert_not_found(result);
    }

    #[tokio::test]
    async fn test_delete_charge_keeps_case() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-022").await;
        let embalming = admitted.initial_charges[0].id;

        h.services
            .ledger
            .delete_charge(&h.ctx, embalming, admitted.case_id, h.branch.id)
            .await
            .unwrap();

        let case = h.services.registry.get_case(&h.ctx, h.branch.id, admitted.case_id).await.unwrap();
        assert_eq!(case.status, CaseStatus::InCustody);
        assert_money_eq(&case.financials.total_bill, dec!(30.00));
        assert_money_zero(&case.financials.embalming_fee);

        let remaining = h
            .services
            .ledger
            .list_charges(&h.ctx, h.branch.id, admitted.case_id)
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].charge_type, ChargeType::Coldroom);
    }

    #[tokio::test]
    async fn test_delete_charge_of_other_branch_not_found() {
        let h = TestHarness::new().await;
        let admin = h.admin_ctx();
        let other = h
            .services
            .settings
            .create_branch(
                &admin,
                CreateBranchRequest {
                    name: "Kumasi".to_string(),
                    code: "KSI".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        h.services
            .settings
            .upsert_service(
                &admin,
                UpsertServiceRequest {
                    id: None,
                    branch_id: other.id,
                    name: "Embalming".to_string(),
                    pricing_model: PricingModel::Flat,
                    unit_price: dec!(450.00),
                    is_active: true,
                },
            )
            .await
            .unwrap();
        let there = h
            .services
            .admission
            .admit(&admin, AdmissionRequestBuilder::new(other.id).with_tag("TAG-024").build())
            .await
            .unwrap();
        let here = h.admit("TAG-024").await;
        let foreign_charge = there.initial_charges[0].id;

        let result = h
            .services
            .ledger
            .delete_charge(&h.ctx, foreign_charge, here.case_id, h.branch.id)
            .await;
        assert_not_found(result);

        let wrong_case = h
            .services
            .ledger
            .delete_charge(&admin, foreign_charge, here.case_id, other.id)
            .await;
        assert_not_found(wrong_case);

        assert_eq!(there.initial_charges.len(), 1);
        assert_eq!(h.store.charges_of(there.case_id).await.len(), 1);
        assert_eq!(h.store.charges_of(here.case_id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_charge_invalidates_list_and_dashboard() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-025").await;
        h.invalidator.clear();

        h.services
            .ledger
            .delete_charge(&h.ctx, admitted.initial_charges[1].id, admitted.case_id, h.branch.id)
            .await
            .unwrap();

        for view in [
            StaleView::CaseDetail { branch_id: h.branch.id, case_id: admitted.case_id },
            StaleView::CaseList { branch_id: h.branch.id },
            StaleView::Dashboard { branch_id: h.branch.id },
        ] {
            assert!(h.invalidator.contains(&view), "{} not invalidated", view);
        }
    }

    #[tokio::test]
    async fn test_delete_unknown_charge_not_found() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-023").await;

        let result = h
            .services
            .ledger
            .delete_charge(&h.ctx, ChargeId::new(), admitted.case_id, h.branch.id)
            .await;

        assert_not_found(result);
    }
}

// ============================================================================
// Payments
// ============================================================================

mod payment_tests {
    use super::*;

    #[tokio::test]
    async fn test_payment_reduces_balance_and_issues_receipt() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-030").await;

        let receipt = h
            .services
            .payments
            .record_payment(&h.ctx, PaymentRequestBuilder::new(h.branch.id, admitted.case_id).build())
            .await
            .unwrap();

        assert_eq!(receipt.receipt_no.as_str(), "ACC-PAY-000001");
        assert_money_eq(&receipt.balance, dec!(330.00));
        assert_money_eq(&receipt.case.financials.total_paid, dec!(200.00));
        assert_financials_consistent(&receipt.case);
        assert_eq!(
            h.numbering.requests().await,
            vec![(h.branch.id, ReceiptType::Payment)]
        );

        for view in [
            StaleView::PaymentList { branch_id: h.branch.id },
            StaleView::CaseList { branch_id: h.branch.id },
            StaleView::Dashboard { branch_id: h.branch.id },
        ] {
            assert!(h.invalidator.contains(&view), "{} not invalidated", view);
        }
    }

    #[tokio::test]
    async fn test_non_positive_payment_rejected_before_numbering() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-031").await;

        for amount in [dec!(0), dec!(-50.00)] {
            let result = h
                .services
                .payments
                .record_payment(
                    &h.ctx,
                    PaymentRequestBuilder::new(h.branch.id, admitted.case_id)
                        .with_amount(amount)
                        .build(),
                )
                .await;
            assert_validation_error(result, Some("amount"));
        }

        assert_eq!(h.numbering.call_count(), 0);
        let payments = h.services.payments.list_payments(&h.ctx, h.branch.id).await.unwrap();
        assert!(payments.is_empty());
    }

    #[tokio::test]
    async fn test_payment_for_unknown_case_not_found() {
        let h = TestHarness::new().await;
        let result = h
            .services
            .payments
            .record_payment(&h.ctx, PaymentRequestBuilder::new(h.branch.id, CaseId::new()).build())
            .await;

        assert_not_found(result);
        assert_eq!(h.numbering.call_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_payments_get_distinct_receipts() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-032").await;
        let request = PaymentRequestBuilder::new(h.branch.id, admitted.case_id)
            .with_amount(dec!(100.00))
            .build();

        let (first, second) = tokio::join!(
            h.services.payments.record_payment(&h.ctx, request.clone()),
            h.services.payments.record_payment(&h.ctx, request.clone()),
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_ne!(first.receipt_no, second.receipt_no);

        let case = h.services.registry.get_case(&h.ctx, h.branch.id, admitted.case_id).await.unwrap();
        assert_money_eq(&case.financials.total_paid, dec!(200.00));
        assert_money_eq(&case.financials.balance, dec!(330.00));
    }

    #[tokio::test]
    async fn test_first_payments_of_two_branches_get_distinct_receipts() {
        let h = TestHarness::new().await;
        let admin = h.admin_ctx();
        let other = h
            .services
            .settings
            .create_branch(
                &admin,
                CreateBranchRequest {
                    name: "Kumasi".to_string(),
                    code: "KSI".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let here = h.admit("TAG-036").await;
        let there = h
            .services
            .admission
            .admit(&admin, AdmissionRequestBuilder::new(other.id).with_tag("TAG-036").build())
            .await
            .unwrap();

        let first = h
            .services
            .payments
            .record_payment(&h.ctx, PaymentRequestBuilder::new(h.branch.id, here.case_id).build())
            .await
            .unwrap();
        let second = h
            .services
            .payments
            .record_payment(&admin, PaymentRequestBuilder::new(other.id, there.case_id).build())
            .await
            .unwrap();

        assert_eq!(first.receipt_no.as_str(), "ACC-PAY-000001");
        assert_eq!(second.receipt_no.as_str(), "KSI-PAY-000001");

        let found = h
            .services
            .receipts
            .find_receipt(&admin, other.id, "KSI-PAY-000001")
            .await
            .unwrap();
        assert!(matches!(found, FoundReceipt::Payment { ref payment, .. } if payment.case_id == there.case_id));
    }

    #[tokio::test]
    async fn test_void_payment_restores_balance() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-033").await;
        let receipt = h
            .services
            .payments
            .record_payment(&h.ctx, PaymentRequestBuilder::new(h.branch.id, admitted.case_id).build())
            .await
            .unwrap();

        h.invalidator.clear();
        h.services
            .payments
            .void_payment(&h.ctx, receipt.payment.id, h.branch.id)
            .await
            .unwrap();

        let case = h.services.registry.get_case(&h.ctx, h.branch.id, admitted.case_id).await.unwrap();
        assert_money_zero(&case.financials.total_paid);
        assert_money_eq(&case.financials.balance, dec!(530.00));
        for view in [
            StaleView::CaseDetail { branch_id: h.branch.id, case_id: admitted.case_id },
            StaleView::Dashboard { branch_id: h.branch.id },
        ] {
            assert!(h.invalidator.contains(&view), "{} not invalidated", view);
        }
    }

    #[tokio::test]
    async fn test_void_payment_of_other_branch_not_found() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-034").await;
        let receipt = h
            .services
            .payments
            .record_payment(&h.ctx, PaymentRequestBuilder::new(h.branch.id, admitted.case_id).build())
            .await
            .unwrap();

        let result = h
            .services
            .payments
            .void_payment(&h.ctx, receipt.payment.id, BranchId::new())
            .await;
        assert_not_found(result);

        let unknown = h
            .services
            .payments
            .void_payment(&h.ctx, PaymentId::new(), h.branch.id)
            .await;
        assert_not_found(unknown);

        let payments = h.services.payments.list_payments(&h.ctx, h.branch.id).await.unwrap();
        assert_eq!(payments.len(), 1);
    }

    #[tokio::test]
    async fn test_payments_listed_newest_first() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-035").await;

        for amount in [dec!(10), dec!(20)] {
            h.services
                .payments
                .record_payment(
                    &h.ctx,
                    PaymentRequestBuilder::new(h.branch.id, admitted.case_id)
                        .with_amount(amount)
                        .build(),
                )
                .await
                .unwrap();
        }

        let payments = h.services.payments.list_payments(&h.ctx, h.branch.id).await.unwrap();
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].receipt_no.as_str(), "ACC-PAY-000002");
    }
}

// ============================================================================
// Discharge
// ============================================================================

mod discharge_tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfirmed_discharge_requires_confirmation() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-040").await;

        let result = h
            .services
            .discharge
            .discharge(
                &h.ctx,
                DischargeRequestBuilder::new(h.branch.id, admitted.case_id)
                    .unconfirmed()
                    .build(),
            )
            .await;

        assert!(matches!(result, Err(CaseError::ConfirmationRequired(_))));
        assert_eq!(h.numbering.call_count(), 0);

        let case = h.services.registry.get_case(&h.ctx, h.branch.id, admitted.case_id).await.unwrap();
        assert_eq!(case.status, CaseStatus::InCustody);
        assert!(case.discharge_receipt_no.is_none());
    }

    #[tokio::test]
    async fn test_discharge_with_outstanding_balance_succeeds() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-041").await;

        let receipt = h
            .services
            .discharge
            .discharge(&h.ctx, DischargeRequestBuilder::new(h.branch.id, admitted.case_id).build())
            .await
            .unwrap();

        assert_eq!(receipt.receipt_no.as_str(), "ACC-DIS-000001");
        assert_eq!(
            h.numbering.requests().await,
            vec![(h.branch.id, ReceiptType::Discharge)]
        );
        assert_money_eq(
            receipt.outstanding_balance.as_ref().expect("balance outstanding"),
            dec!(530.00),
        );
        assert_eq!(receipt.storage_days_preview, 10);

        let case = receipt.case;
        assert_eq!(case.status, CaseStatus::Discharged);
        assert_eq!(case.discharge_date, Some(DateFixtures::discharge_date()));
        assert_eq!(case.discharge_receipt_no.as_ref(), Some(&receipt.receipt_no));
        assert_eq!(case.storage_days, Some(10));
    }

    #[tokio::test]
    async fn test_discharge_twice_rejected_without_new_receipt() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-042").await;
        let request = DischargeRequestBuilder::new(h.branch.id, admitted.case_id).build();

        h.services.discharge.discharge(&h.ctx, request.clone()).await.unwrap();
        let second = h.services.discharge.discharge(&h.ctx, request).await;

        match second {
            Err(CaseError::InvalidState { from, .. }) => assert_eq!(from, CaseStatus::Discharged),
            other => panic!("Expected invalid state, got {:?}", other),
        }
        assert_eq!(h.numbering.call_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_discharges_keep_first_receipt() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-043").await;
        let request = DischargeRequestBuilder::new(h.branch.id, admitted.case_id).build();

        let (first, second) = tokio::join!(
            h.services.discharge.discharge(&h.ctx, request.clone()),
            h.services.discharge.discharge(&h.ctx, request.clone()),
        );

        let (winner, loser) = match (first, second) {
            (Ok(receipt), Err(err)) | (Err(err), Ok(receipt)) => (receipt, err),
            other => panic!("Expected exactly one discharge to succeed, got {:?}", other),
        };
        assert!(matches!(
            loser,
            CaseError::InvalidState { from: CaseStatus::Discharged, .. }
        ));

        let case = h.services.registry.get_case(&h.ctx, h.branch.id, admitted.case_id).await.unwrap();
        assert_eq!(case.discharge_receipt_no, Some(winner.receipt_no));
    }

    #[tokio::test]
    async fn test_discharge_unknown_case_not_found() {
        let h = TestHarness::new().await;
        let result = h
            .services
            .discharge
            .discharge(&h.ctx, DischargeRequestBuilder::new(h.branch.id, CaseId::new()).build())
            .await;

        assert_not_found(result);
        assert_eq!(h.numbering.call_count(), 0);
    }

    #[tokio::test]
    async fn test_preview_is_read_only() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-043").await;

        let preview = h
            .services
            .discharge
            .preview_discharge(&h.ctx, h.branch.id, admitted.case_id, Some(DateFixtures::discharge_date()))
            .await
            .unwrap();

        assert_eq!(preview.storage_days, 10);
        assert!(preview.balance_outstanding);
        assert_money_eq(&preview.balance, dec!(530.00));
        assert_eq!(h.numbering.call_count(), 0);

        let case = h.services.registry.get_case(&h.ctx, h.branch.id, admitted.case_id).await.unwrap();
        assert_eq!(case.status, CaseStatus::InCustody);
    }

    #[tokio::test]
    async fn test_full_billing_scenario() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-044").await;
        assert_money_eq(&admitted.case.financials.total_bill, dec!(530.00));

        let payment = h
            .services
            .payments
            .record_payment(
                &h.ctx,
                PaymentRequestBuilder::new(h.branch.id, admitted.case_id)
                    .with_amount(dec!(200.00))
                    .build(),
            )
            .await
            .unwrap();
        assert_money_eq(&payment.balance, dec!(330.00));

        let discharged = h
            .services
            .discharge
            .discharge(&h.ctx, DischargeRequestBuilder::new(h.branch.id, admitted.case_id).build())
            .await
            .unwrap();

        assert_money_eq(
            discharged.outstanding_balance.as_ref().expect("balance outstanding"),
            dec!(330.00),
        );
        assert_eq!(discharged.case.status, CaseStatus::Discharged);
        assert_financials_consistent(&discharged.case);
    }
}

// ============================================================================
// Registry
// ============================================================================

mod registry_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_cases_filters_by_status() {
        let h = TestHarness::new().await;
        let first = h.admit("TAG-050").await;
        h.admit("TAG-051").await;
        h.services
            .discharge
            .discharge(&h.ctx, DischargeRequestBuilder::new(h.branch.id, first.case_id).build())
            .await
            .unwrap();

        let in_custody = h
            .services
            .registry
            .list_cases(&h.ctx, h.branch.id, CaseQuery::with_status(CaseStatus::InCustody))
            .await
            .unwrap();
        assert_eq!(in_custody.len(), 1);
        assert_eq!(in_custody[0].tag_no, "TAG-051");

        let all = h
            .services
            .registry
            .list_cases(&h.ctx, h.branch.id, CaseQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_get_case_of_other_branch_not_found() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-052").await;

        let result = h
            .services
            .registry
            .get_case(&h.ctx, BranchId::new(), admitted.case_id)
            .await;
        assert_not_found(result);
    }

    #[tokio::test]
    async fn test_update_details_changes_notes_and_tag() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-053").await;

        let case = h
            .services
            .registry
            .update_case_details(
                &h.ctx,
                h.branch.id,
                admitted.case_id,
                CaseDetailsUpdate {
                    tag_no: Some(" TAG-053A ".to_string()),
                    notes: Some("Family viewing on Friday".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(case.tag_no, "TAG-053A");
        assert_eq!(case.notes.as_deref(), Some("Family viewing on Friday"));
        assert_money_eq(&case.financials.total_bill, dec!(530.00));
    }

    #[tokio::test]
    async fn test_update_details_rejects_taken_tag() {
        let h = TestHarness::new().await;
        h.admit("TAG-054").await;
        let second = h.admit("TAG-055").await;

        let result = h
            .services
            .registry
            .update_case_details(
                &h.ctx,
                h.branch.id,
                second.case_id,
                CaseDetailsUpdate {
                    tag_no: Some("TAG-054".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert_duplicate_error(result, "Tag number already exists");
    }

    #[tokio::test]
    async fn test_empty_update_rejected() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-056").await;

        let result = h
            .services
            .registry
            .update_case_details(&h.ctx, h.branch.id, admitted.case_id, CaseDetailsUpdate::default())
            .await;

        assert_validation_error(result, None);
    }
}

// ============================================================================
// Branches and services
// ============================================================================

mod settings_tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_branch_with_case_rejected() {
        let h = TestHarness::new().await;
        h.admit("TAG-060").await;

        let result = h.services.settings.delete_branch(&h.admin_ctx(), h.branch.id).await;

        assert!(matches!(result, Err(CaseError::ReferenceViolation(_))));
        assert_eq!(h.store.case_count().await, 1);
    }

    #[tokio::test]
    async fn test_delete_unused_branch() {
        let h = TestHarness::new().await;
        let admin = h.admin_ctx();
        let branch = h
            .services
            .settings
            .create_branch(
                &admin,
                CreateBranchRequest {
                    name: "Takoradi".to_string(),
                    code: "tkd".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(branch.code, "TKD");

        h.services.settings.delete_branch(&admin, branch.id).await.unwrap();

        let branches = h.services.settings.list_branches(&admin).await.unwrap();
        assert!(branches.iter().all(|b| b.id != branch.id));
        assert!(h.invalidator.contains(&StaleView::BranchList));
    }

    #[tokio::test]
    async fn test_duplicate_branch_code_rejected() {
        let h = TestHarness::new().await;
        let result = h
            .services
            .settings
            .create_branch(
                &h.admin_ctx(),
                CreateBranchRequest {
                    name: "Another Accra".to_string(),
                    code: BranchFixtures::accra().code,
                    ..Default::default()
                },
            )
            .await;

        assert_duplicate_error(result, "Branch code already exists");
    }

    #[tokio::test]
    async fn test_staff_sees_only_own_branch() {
        let h = TestHarness::new().await;
        let admin = h.admin_ctx();
        h.services
            .settings
            .create_branch(
                &admin,
                CreateBranchRequest {
                    name: "Tamale".to_string(),
                    code: "TML".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(h.services.settings.list_branches(&admin).await.unwrap().len(), 2);

        let visible = h.services.settings.list_branches(&h.ctx).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, h.branch.id);
    }

    #[tokio::test]
    async fn test_inactive_service_not_billed_on_admission() {
        let h = TestHarness::new().await;
        let services = h.services.settings.list_services(&h.ctx, h.branch.id).await.unwrap();
        let embalming = services.iter().find(|s| s.name == "Embalming").unwrap();

        h.services
            .settings
            .upsert_service(
                &h.admin_ctx(),
                UpsertServiceRequest {
                    id: Some(embalming.id),
                    branch_id: h.branch.id,
                    name: "Embalming".to_string(),
                    pricing_model: PricingModel::Flat,
                    unit_price: dec!(500.00),
                    is_active: false,
                },
            )
            .await
            .unwrap();

        let result = h.admit("TAG-061").await;
        assert_eq!(result.initial_charges.len(), 1);
        assert_eq!(result.initial_charges[0].charge_type, ChargeType::Coldroom);
        assert!(h.invalidator.contains(&StaleView::Settings { branch_id: h.branch.id }));
    }

    #[tokio::test]
    async fn test_delete_billed_service_rejected() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-062").await;
        let service_id = admitted.initial_charges[0].service_id.expect("catalog charge");

        let result = h
            .services
            .settings
            .delete_service(&h.admin_ctx(), h.branch.id, service_id)
            .await;

        assert!(matches!(result, Err(CaseError::ReferenceViolation(_))));
    }
}

// ============================================================================
// Receipts and dashboard
// ============================================================================

mod lookup_tests {
    use super::*;

    #[tokio::test]
    async fn test_find_payment_and_discharge_receipts() {
        let h = TestHarness::new().await;
        let admitted = h.admit("TAG-070").await;
        let paid = h
            .services
            .payments
            .record_payment(&h.ctx, PaymentRequestBuilder::new(h.branch.id, admitted.case_id).build())
            .await
            .unwrap();
        let discharged = h
            .services
            .discharge
            .discharge(&h.ctx, DischargeRequestBuilder::new(h.branch.id, admitted.case_id).build())
            .await
            .unwrap();

        match h
            .services
            .receipts
            .find_receipt(&h.ctx, h.branch.id, paid.receipt_no.as_str())
            .await
            .unwrap()
        {
            FoundReceipt::Payment { payment, case } => {
                assert_eq!(payment.id, paid.payment.id);
                assert_eq!(case.map(|c| c.id), Some(admitted.case_id));
            }
            other => panic!("Expected payment receipt, got {:?}", other),
        }

        match h
            .services
            .receipts
            .find_receipt(&h.ctx, h.branch.id, discharged.receipt_no.as_str())
            .await
            .unwrap()
        {
            FoundReceipt::Discharge { case } => assert_eq!(case.id, admitted.case_id),
            other => panic!("Expected discharge receipt, got {:?}", other),
        }

        let missing = h.services.receipts.find_receipt(&h.ctx, h.branch.id, "ACC-PAY-999999").await;
        assert_not_found(missing);
    }

    #[tokio::test]
    async fn test_branch_summary() {
        let h = TestHarness::new().await;
        let first = h.admit("TAG-071").await;
        h.admit("TAG-072").await;

        h.services
            .payments
            .record_payment(
                &h.ctx,
                PaymentRequestBuilder::new(h.branch.id, first.case_id)
                    .with_amount(dec!(530.00))
                    .build(),
            )
            .await
            .unwrap();
        h.services
            .discharge
            .discharge(&h.ctx, DischargeRequestBuilder::new(h.branch.id, first.case_id).build())
            .await
            .unwrap();

        let summary = h.services.dashboard.branch_summary(&h.ctx, h.branch.id).await.unwrap();

        assert_eq!(summary.total_cases, 2);
        assert_eq!(summary.in_custody, 1);
        assert_eq!(summary.discharged, 1);
        assert_money_eq(&summary.total_billed, dec!(1060.00));
        assert_money_eq(&summary.outstanding_balance, dec!(530.00));
    }
}

mod context_tests {
    use super::*;

    #[test]
    fn test_staff_context_scoped_to_branch() {
        let branch = BranchId::new();
        let ctx = RequestContext::staff(UserId::new(), branch);

        assert!(ctx.can_access(branch));
        assert!(!ctx.can_access(BranchId::new()));
        assert!(!ctx.can_manage_settings());
        assert!(RequestContext::admin(UserId::new()).can_access(branch));
    }
}
