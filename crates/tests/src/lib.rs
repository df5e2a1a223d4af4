//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（无需 broker）：传输源 -> 队列 -> 分发器 -> 处理器 -> 连接器 -> 发布
//! - 上报扇出调度测试

#[cfg(test)]
mod contract_tests {
    use std::collections::HashMap;

    use contracts::{Message, MessageType, SourceType, HEADER_MESSAGE_TYPE, HEADER_SOURCE_TYPE};

    #[test]
    fn test_demo_configs_load() {
        let demos = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");

        let edge = config_loader::ConfigLoader::load_from_path(&demos.join("edge.toml")).unwrap();
        assert_eq!(edge.hub.role, SourceType::Edge);
        assert_eq!(edge.devices.len(), 3);
        assert!(!edge.devices[2].active);

        let cloud = config_loader::ConfigLoader::load_from_path(&demos.join("cloud.toml")).unwrap();
        assert_eq!(cloud.hub.role, SourceType::Cloud);
        assert!(!cloud.scheduler.enabled);
    }

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_header_resolution_snapshot() {
        let headers = HashMap::from([
            (HEADER_MESSAGE_TYPE.to_string(), "INVOCATION".to_string()),
            (HEADER_SOURCE_TYPE.to_string(), "Cloud".to_string()),
        ]);
        let message = Message::from_headers("/command/dev-1", "{}", &headers);
        assert_eq!(message.message_type, Some(MessageType::CommandInvocation));
        assert_eq!(message.source_type, SourceType::Cloud);

        let message = Message::from_headers("/x/dev-1", "{}", &HashMap::new());
        assert_eq!(message.message_type, None);
        assert_eq!(message.source_type, SourceType::Unknown);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use contracts::{
        ContractError, Device, EligibilityPolicy, HubConfig, Message, MessageType, Processor,
        ReportKind, ReportOutcome, SourceType,
    };
    use device_connector::{
        ChannelPublisher, ConnectorHandle, ConnectorRegistry, DeviceDirectory, PublishEnvelope,
        SimulatedConnector,
    };
    use dispatcher::{
        CommandInvocationProcessor, DispatcherConfig, HeartbeatProcessor, ProcessorRegistry,
        TypedDispatcher,
    };
    use fanout::{FanoutConfig, FanoutScheduler};
    use ingestion::{IngestQueue, IngestionPipeline, MockTransport};
    use tokio_util::sync::CancellationToken;

    fn edge_config() -> DispatcherConfig {
        DispatcherConfig {
            poll_timeout: Duration::from_millis(50),
            process_timeout: Duration::from_millis(500),
            shutdown_grace: Duration::from_millis(500),
            ..DispatcherConfig::new(SourceType::Edge)
        }
    }

    fn simulated_registry(publisher: ChannelPublisher) -> Arc<ConnectorRegistry> {
        let handle = ConnectorHandle::new(
            Arc::new(SimulatedConnector::default()),
            Arc::new(publisher),
        );
        Arc::new(ConnectorRegistry::from_handles(vec![Arc::new(handle)]).unwrap())
    }

    /// Processor sleeping past any reasonable deadline
    struct StuckProcessor {
        started: AtomicUsize,
    }

    #[async_trait]
    impl Processor for StuckProcessor {
        fn name(&self) -> &str {
            "stuck"
        }

        fn message_type(&self) -> MessageType {
            MessageType::Notification
        }

        async fn process(&self, _topic: &str, _content: &str) -> Result<(), ContractError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }

    /// End-to-end test: MockTransport -> IngestQueue -> TypedDispatcher
    /// -> CommandInvocationProcessor -> ConnectorHandle -> Publisher
    ///
    /// 验证完整的指令数据流：
    /// 1. Mock 传输源生成来自云端的指令帧
    /// 2. 分发器按类型路由到指令处理器
    /// 3. 连接器执行指令并发布确认
    #[tokio::test]
    async fn test_e2e_edge_command_flow() {
        let directory = DeviceDirectory::with_devices([Device::new("device-001", "custom")]);
        let (publisher, mut published) = ChannelPublisher::channel();
        let connectors = simulated_registry(publisher);

        let handlers: Vec<Arc<dyn Processor>> = vec![
            Arc::new(CommandInvocationProcessor::new(directory.clone(), connectors.clone())),
            Arc::new(HeartbeatProcessor::new(directory.clone())),
        ];
        let processors = ProcessorRegistry::from_processors(handlers).unwrap();

        let mut ingestion = IngestionPipeline::with_capacity(100).unwrap();
        ingestion
            .register_source(Box::new(
                MockTransport::command(
                    "cloud_commands",
                    50.0,
                    "device-001",
                    r#"{"identify": "reboot", "inputParams": {"delay": 3}}"#,
                    SourceType::Cloud,
                )
                .with_max_frames(3),
            ))
            .unwrap();

        let dispatcher = TypedDispatcher::new(edge_config(), ingestion.queue(), processors);
        let token = CancellationToken::new();
        let handle = dispatcher.spawn(token.clone());
        ingestion.start_all();

        let mut acks = Vec::new();
        while acks.len() < 3 {
            let msg = tokio::time::timeout(Duration::from_secs(5), published.recv())
                .await
                .expect("acknowledgment not published in time")
                .unwrap();
            acks.push(msg);
        }

        ingestion.stop_all();
        token.cancel();
        let summary = handle.await.unwrap();

        assert!(summary.completed >= 3);
        assert_eq!(summary.rejected, 0);
        for ack in &acks {
            assert_eq!(ack.topic, "/acknowledgment/device-001");
            assert_eq!(ack.message_type, MessageType::CommandAcknowledgment);
            let envelope: PublishEnvelope = serde_json::from_str(&ack.payload).unwrap();
            assert_eq!(envelope.device_code, "device-001");
            assert_eq!(envelope.data["command"], "reboot");
        }
    }

    /// 自回环与未知来源被拒绝，合法消息照常处理
    #[tokio::test]
    async fn test_e2e_rejections_do_not_block_valid_traffic() {
        let directory = DeviceDirectory::with_devices([
            Device::new("device-001", "custom").with_offline(true)
        ]);
        let processors =
            ProcessorRegistry::from_processors(vec![Arc::new(HeartbeatProcessor::new(
                directory.clone(),
            ))])
            .unwrap();

        let queue = IngestQueue::new(10).unwrap();
        let heartbeat = |source| {
            Message::new("/heartbeat/device-001", "{}", Some(MessageType::Heartbeat), source)
        };
        assert!(queue.put(heartbeat(SourceType::Edge)));
        assert!(queue.put(heartbeat(SourceType::Unknown)));
        assert!(queue.put(Message::new(
            "/heartbeat/device-001",
            "{}",
            None,
            SourceType::Cloud
        )));
        assert!(queue.put(Message::new(
            "/event/device-001",
            "{}",
            Some(MessageType::Event),
            SourceType::Cloud
        )));
        assert!(queue.put(heartbeat(SourceType::Cloud)));
        queue.close();

        let dispatcher = TypedDispatcher::new(edge_config(), queue, processors);
        let summary = dispatcher.run(CancellationToken::new()).await;

        assert_eq!(summary.total, 5);
        assert_eq!(summary.rejected, 3);
        assert_eq!(summary.dropped, 1);
        assert_eq!(summary.completed, 1);

        let device = directory.get("device-001").unwrap();
        assert!(!device.offline);
        assert!(device.last_heartbeat.is_some());
    }

    /// 超时的消息被放弃，后续消息不被阻塞
    #[tokio::test]
    async fn test_e2e_deadline_bounds_each_message() {
        let stuck = Arc::new(StuckProcessor {
            started: AtomicUsize::new(0),
        });
        let processors = ProcessorRegistry::from_processors(vec![stuck.clone()]).unwrap();

        let queue = IngestQueue::new(10).unwrap();
        for _ in 0..3 {
            queue.put(Message::new(
                "/notification/device-001",
                "{}",
                Some(MessageType::Notification),
                SourceType::Cloud,
            ));
        }
        queue.close();

        let config = DispatcherConfig {
            process_timeout: Duration::from_millis(50),
            shutdown_grace: Duration::from_millis(100),
            ..edge_config()
        };
        let dispatcher = TypedDispatcher::new(config, queue, processors);

        let started = Instant::now();
        let summary = dispatcher.run(CancellationToken::new()).await;

        assert_eq!(summary.timed_out, 3);
        assert_eq!(stuck.started.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    /// 队列满时拒绝新消息，已入队消息保持 FIFO
    #[tokio::test]
    async fn test_e2e_queue_overflow_drops_newest() {
        let queue = IngestQueue::new(2).unwrap();
        for i in 0..3 {
            let accepted = queue.put(
                Message::new("/event/d", "{}", Some(MessageType::Event), SourceType::Cloud)
                    .with_id(format!("m{i}")),
            );
            assert_eq!(accepted, i < 2);
        }

        assert_eq!(queue.metrics().snapshot().messages_dropped, 1);
        let first = queue.poll(Duration::from_millis(10)).await.unwrap();
        let second = queue.poll(Duration::from_millis(10)).await.unwrap();
        assert_eq!((first.id.as_str(), second.id.as_str()), ("m0", "m1"));
        assert!(queue.poll(Duration::from_millis(10)).await.is_none());
    }

    /// 心跳上线 -> 调度器上报 -> 发布
    #[tokio::test]
    async fn test_e2e_heartbeat_then_fanout_report() {
        let directory = DeviceDirectory::with_devices([
            Device::new("device-001", "custom").with_offline(true),
            Device::new("device-002", "custom").with_active(false),
        ]);
        let (publisher, mut published) = ChannelPublisher::channel();
        let connectors = simulated_registry(publisher);

        let scheduler = FanoutScheduler::new(
            FanoutConfig {
                eligibility: EligibilityPolicy::ActiveOnline,
                ..FanoutConfig::default()
            },
            directory.clone(),
            connectors,
        );

        // Offline: nothing eligible yet
        let report = scheduler.tick(ReportKind::Property).await;
        assert_eq!(report.eligible, 0);

        let processors =
            ProcessorRegistry::from_processors(vec![Arc::new(HeartbeatProcessor::new(
                directory.clone(),
            ))])
            .unwrap();
        let queue = IngestQueue::new(4).unwrap();
        queue.put(Message::new(
            "/heartbeat/device-001",
            "{}",
            Some(MessageType::Heartbeat),
            SourceType::Cloud,
        ));
        queue.close();
        TypedDispatcher::new(edge_config(), queue, processors)
            .run(CancellationToken::new())
            .await;

        let report = scheduler.tick(ReportKind::Property).await;
        assert_eq!(report.eligible, 1);
        assert_eq!(report.join().await, vec![ReportOutcome::Published]);

        let msg = published.recv().await.unwrap();
        assert_eq!(msg.topic, "/property/device-001");
        let envelope: PublishEnvelope = serde_json::from_str(&msg.payload).unwrap();
        assert_eq!(envelope.data["key"], "value");

        assert!(scheduler.shutdown().await);
    }

    /// 配置文件驱动的组件装配
    #[test]
    fn test_e2e_config_drives_wiring() {
        let config: HubConfig = config_loader::ConfigLoader::load_from_str(
            r#"
            [hub]
            name = "cloud-01"
            role = "cloud"

            [queue]
            capacity = 16
            poll_timeout_ms = 200

            [dispatcher]
            process_timeout_ms = 750

            [scheduler]
            admission_wait_ms = 100
            eligibility = "active"
            [scheduler.property]
            period_ms = 1000
            max_concurrent_tasks = 2
            max_workers = 1
            [scheduler.event]
            period_ms = 2000
            max_concurrent_tasks = 3

            [[devices]]
            code = "device-001"
            identify = "custom"
            "#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let dispatcher = DispatcherConfig::from(&config);
        assert_eq!(dispatcher.local_role, SourceType::Cloud);
        assert_eq!(dispatcher.poll_timeout, Duration::from_millis(200));
        assert_eq!(dispatcher.process_timeout, Duration::from_millis(750));

        let fanout = FanoutConfig::from(&config.scheduler);
        assert_eq!(fanout.admission_wait, Duration::from_millis(100));
        assert_eq!(fanout.eligibility, EligibilityPolicy::Active);
        assert_eq!(fanout.property.max_workers, 1);
        assert_eq!(fanout.event.max_concurrent_tasks, 3);
        assert_eq!(fanout.event.max_workers, 4);

        assert!(IngestQueue::new(config.queue.capacity).is_ok());
    }
}
