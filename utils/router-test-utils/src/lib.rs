/********************************************************************************
 * Copyright (c) 2026 Contributors to the wamp-router project
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod logging;
pub use logging::init_logging;

mod mock_delivery;
pub use mock_delivery::{
    FailingDeliveryEngine, RecordingDeliveryEngine, RecordingSubscriberSession,
};

mod mock_rpc;
pub use mock_rpc::{
    CountingInvocationHandler, RecordedInvocation, RecordingCalleeSession, RecordingCallerChannel,
    RecordingOperationCatalog,
};
